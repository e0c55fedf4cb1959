//! Prompt side channel
//!
//! Free text typed next to the player is posted to an inference endpoint
//! when the viewer presses Enter. Submissions are fire-and-forget: the
//! outcome is logged and nothing is retried.

use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;
use url::Url;

/// Body of a prompt submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRequest {
    pub prompt: String,
}

/// Keys the prompt field reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Other,
}

/// Destination for submitted prompts
#[async_trait]
pub trait PromptSink: Send + Sync {
    async fn send_prompt(&self, prompt: &str) -> Result<()>;
}

/// Posts prompts as JSON over HTTP
pub struct HttpPromptClient {
    client: Client,
    endpoint: Url,
}

impl HttpPromptClient {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl PromptSink for HttpPromptClient {
    async fn send_prompt(&self, prompt: &str) -> Result<()> {
        let body = PromptRequest {
            prompt: prompt.to_string(),
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::PromptRejected {
                status: status.as_u16(),
            });
        }

        info!(endpoint = %self.endpoint, chars = prompt.chars().count(), "Prompt sent");
        Ok(())
    }
}

/// Text input state for the prompt field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptField {
    value: String,
}

impl PromptField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    /// Handle a key press, returning the text to submit on Enter.
    ///
    /// The field keeps its text after submission.
    pub fn on_key(&self, key: Key) -> Option<String> {
        match key {
            Key::Enter => Some(self.value.clone()),
            Key::Other => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_submits_current_text() {
        let mut field = PromptField::new();
        field.set_value("make it rain");
        assert_eq!(field.on_key(Key::Other), None);
        assert_eq!(field.on_key(Key::Enter).as_deref(), Some("make it rain"));
        assert_eq!(field.value(), "make it rain");
    }

    #[test]
    fn test_request_body() {
        let body = PromptRequest {
            prompt: "hello".into(),
        };
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"prompt":"hello"}"#);
    }
}
