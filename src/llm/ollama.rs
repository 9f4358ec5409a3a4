//! Ollama local model backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::provider::{Provider, decode, empty_result, send, trim_endpoint};
use crate::error::ProviderError;
use crate::prompt::NeutralMessage;

const NAME: &str = "ollama";

/// Client for a local Ollama server's `/api/chat` endpoint.
pub struct OllamaProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl OllamaProvider {
    pub const DEFAULT_ENDPOINT: &'static str = "http://localhost:11434";

    pub fn new(client: reqwest::Client, model: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            model: model.into(),
        }
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = trim_endpoint(&endpoint.into());
        self
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    stream: bool,
    options: Options,
}

#[derive(Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct Options {
    temperature: f64,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<Message>,
}

#[async_trait]
impl Provider for OllamaProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn generate(
        &self,
        messages: &[NeutralMessage],
        temperature: f64,
    ) -> Result<String, ProviderError> {
        let request = ChatRequest {
            model: &self.model,
            messages: messages
                .iter()
                .map(|m| Message {
                    role: m.role.as_str().to_string(),
                    content: m.text(),
                })
                .collect(),
            stream: false,
            options: Options { temperature },
        };

        debug!(provider = NAME, model = %self.model, "Sending chat request");

        let builder = self
            .client
            .post(format!("{}/api/chat", self.endpoint))
            .json(&request);

        let body = send(NAME, &self.model, builder).await?;
        let response: ChatResponse = decode(NAME, &body)?;

        response
            .message
            .map(|m| m.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| empty_result(NAME))
    }
}
