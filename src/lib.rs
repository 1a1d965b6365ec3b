pub mod config;
pub mod dotenv;
pub mod logging;
pub mod model;
pub mod providers;

use anyhow::{Context, Result};
use reqwest::Client;
use std::env;
use tracing::info;

use config::{Config, resolve_api_key};
use dotenv::{DEFAULT_DOTENV_PATH, Environment};
use providers::openai::ChatClient;

pub async fn run() -> Result<()> {
    let mut vars = Environment::from_process();
    let dotenv_found = dotenv::load_dotenv_from_file(DEFAULT_DOTENV_PATH, &mut vars)
        .with_context(|| format!("Failed to read config file '{DEFAULT_DOTENV_PATH}'"))?;
    let _log_guard = logging::init(&vars);

    let args: Vec<String> = env::args().skip(1).collect();
    let answer = execute(&vars, &args, dotenv_found).await?;
    println!("{answer}");
    Ok(())
}

/// Resolves configuration and the credential from `vars`, then sends one chat
/// request. Fails before any network access if the credential is missing.
pub async fn execute(vars: &Environment, args: &[String], dotenv_found: bool) -> Result<String> {
    let cfg = Config::from_env(vars).with_prompt_args(args);
    info!(
        model = %cfg.model,
        model_base_url = %cfg.model_base_url,
        dotenv_found,
        "loaded runtime configuration"
    );

    let api_key = resolve_api_key(vars)?;
    let http = Client::builder()
        .build()
        .context("Failed to initialize HTTP client")?;
    let client = ChatClient::new(http, &cfg.model_base_url, api_key);

    model::chat_once(&client, &cfg).await
}
