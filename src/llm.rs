//! Blocking client for OpenAI-compatible chat-completions endpoints.
//!
//! One POST per task, no retries. Timeouts and transport behavior are
//! whatever ureq defaults to.

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Chat client bound to one base URL and, for hosted providers, one API key.
///
/// The key is handed in explicitly at construction; this module never reads
/// the process environment.
pub struct ChatClient {
    base_url: String,
    api_key: Option<String>,
}

impl ChatClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key,
        }
    }

    /// Run one chat completion and return the assistant message text.
    pub fn complete(&self, model: &str, system: &str, user: &str) -> Result<String> {
        let request = ChatRequest {
            model,
            temperature: 0.7,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        let request_body = serde_json::to_string(&request).context("Failed to serialize chat request")?;

        let url = format!("{}/chat/completions", self.base_url);
        let mut req = ureq::post(&url).header("Content-Type", "application/json");
        if let Some(ref key) = self.api_key {
            req = req.header("Authorization", &format!("Bearer {}", key));
        }

        log::debug!("POST {} model={}", url, model);

        let mut response = req
            .send(request_body.as_bytes())
            .context(format!("Chat completion request to {} failed", self.base_url))?;

        let response_body = response
            .body_mut()
            .read_to_string()
            .context("Failed to read chat response")?;
        let response: ChatResponse =
            serde_json::from_str(&response_body).context("Failed to parse chat response")?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| eyre::eyre!("No choices in chat response"))?;

        Ok(choice.message.content)
    }

    /// Count the models the endpoint advertises. Used by `doctor` as a
    /// reachability probe.
    pub fn list_models(&self) -> Result<usize> {
        let url = format!("{}/models", self.base_url);
        let mut req = ureq::get(&url);
        if let Some(ref key) = self.api_key {
            req = req.header("Authorization", &format!("Bearer {}", key));
        }

        let mut response = req.call().context(format!("Model listing request to {} failed", self.base_url))?;

        let response_body = response
            .body_mut()
            .read_to_string()
            .context("Failed to read models response")?;
        let response: serde_json::Value =
            serde_json::from_str(&response_body).context("Failed to parse models response")?;

        Ok(response["data"].as_array().map(|a| a.len()).unwrap_or(0))
    }
}
