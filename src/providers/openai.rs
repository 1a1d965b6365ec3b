use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use crate::model::Message;
use crate::providers::http_errors::model_api_request_error;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

fn chat_completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

fn to_chat_messages(messages: &[Message]) -> Vec<ChatMessage<'_>> {
    messages
        .iter()
        .map(|msg| ChatMessage {
            role: msg.role.as_str(),
            content: &msg.content,
        })
        .collect()
}

fn first_choice_content(parsed: ChatCompletionResponse) -> Result<String> {
    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("Chat completion response contained no choices"))?;
    choice
        .message
        .content
        .ok_or_else(|| anyhow!("First chat completion choice has no text content"))
}

/// Client for an OpenAI-compatible `chat/completions` endpoint.
#[derive(Clone)]
pub struct ChatClient {
    http: Client,
    api_url: String,
    api_key: String,
}

impl fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatClient")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl ChatClient {
    pub fn new(http: Client, base_url: &str, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_url: chat_completions_url(base_url),
            api_key: api_key.into(),
        }
    }

    /// Sends one chat completion request and returns the text of the first
    /// choice.
    pub async fn chat(&self, model: &str, messages: &[Message]) -> Result<String> {
        let body = ChatCompletionRequest {
            model,
            messages: to_chat_messages(messages),
        };
        debug!(
            api_url = %self.api_url,
            model = %model,
            message_count = messages.len(),
            "sending chat completion request"
        );

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                warn!(
                    api_url = %self.api_url,
                    model = %model,
                    error = %err,
                    "chat completion request failed"
                );
                model_api_request_error(err, &self.api_url)
            })?;

        let status = response.status();
        if !status.is_success() {
            let response_body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read response body>".to_string());
            warn!(
                api_url = %self.api_url,
                model = %model,
                status = %status,
                response_body_len = response_body.len(),
                "chat completion endpoint returned non-success status"
            );
            return Err(anyhow!(
                "Model request failed with status {}: {}",
                status,
                response_body
            ));
        }

        let response_body = response
            .text()
            .await
            .context("Failed to read chat completion response body")?;
        let parsed: ChatCompletionResponse = serde_json::from_str(&response_body)
            .context("Failed to parse chat completion response")?;
        debug!(
            model = %model,
            choice_count = parsed.choices.len(),
            "received chat completion response"
        );
        first_choice_content(parsed)
    }
}
