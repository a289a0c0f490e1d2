//! Command implementations

pub mod card;
pub mod completions;
pub mod doctor;
pub mod story;

use eyre::{Context, Result};
use std::io::{self, Write};
use terminal_size::{Width, terminal_size};

use crate::config::{Config, Provider};
use crate::llm::ChatClient;

/// Build the chat client for the selected provider. OpenRouter requires the
/// key captured in main; this is the single place that enforces it, before
/// any prompt is shown and before any socket is opened.
pub(crate) fn build_client(provider: Provider, api_key: Option<&str>, config: &Config) -> Result<ChatClient> {
    match provider {
        Provider::OpenRouter => {
            let key = api_key.ok_or_else(|| {
                eyre::eyre!("OPENROUTER_API_KEY is not set; export it or rerun with --local")
            })?;
            Ok(ChatClient::new(
                config.endpoints.base_url(provider),
                Some(key.to_string()),
            ))
        }
        Provider::Local => Ok(ChatClient::new(config.endpoints.base_url(provider), None)),
    }
}

/// Use the CLI argument when given, otherwise prompt and read one line.
pub(crate) fn read_input(arg: Option<&str>, prompt: &str) -> Result<String> {
    if let Some(value) = arg {
        return Ok(value.trim().to_string());
    }

    print!("{}", prompt);
    io::stdout().flush().context("Failed to flush stdout")?;

    let mut line = String::new();
    io::stdin().read_line(&mut line).context("Failed to read from stdin")?;
    Ok(line.trim().to_string())
}

/// Horizontal rule width: terminal width capped at 80 columns.
pub(crate) fn rule_width() -> usize {
    terminal_size().map(|(Width(w), _)| (w as usize).min(80)).unwrap_or(80)
}
