use anyhow::Result;
use tracing::debug;

use crate::config::Config;
use crate::providers::openai::ChatClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    User,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Sends `cfg.prompt` as a single user message and returns the reply text.
pub async fn chat_once(client: &ChatClient, cfg: &Config) -> Result<String> {
    let messages = [Message::user(cfg.prompt.as_str())];
    debug!(
        model = %cfg.model,
        prompt_len = cfg.prompt.len(),
        "dispatching chat completion"
    );
    client.chat(&cfg.model, &messages).await
}
