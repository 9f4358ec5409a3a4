//! Anthropic Messages API backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::provider::{Provider, decode, empty_result, send, trim_endpoint};
use crate::error::ProviderError;
use crate::prompt::{NeutralMessage, Role};

const NAME: &str = "anthropic";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

/// Client for the Anthropic `/messages` endpoint.
pub struct AnthropicProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl AnthropicProvider {
    pub const DEFAULT_ENDPOINT: &'static str = "https://api.anthropic.com/v1";

    pub fn new(
        client: reqwest::Client,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
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
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

/// System messages move to the top-level `system` field; the rest keep their order.
fn split_system(messages: &[NeutralMessage]) -> (Option<String>, Vec<Message>) {
    let mut system = Vec::new();
    let mut rest = Vec::new();

    for message in messages {
        match message.role {
            Role::System => system.extend(message.parts.iter().cloned()),
            Role::User | Role::Assistant => rest.push(Message {
                role: message.role.as_str(),
                content: message.text(),
            }),
        }
    }

    let system = system.join("\n").trim().to_string();
    ((!system.is_empty()).then_some(system), rest)
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn generate(
        &self,
        messages: &[NeutralMessage],
        temperature: f64,
    ) -> Result<String, ProviderError> {
        let (system, messages) = split_system(messages);
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            temperature,
            system,
            messages,
        };

        debug!(provider = NAME, model = %self.model, "Sending messages request");

        let builder = self
            .client
            .post(format!("{}/messages", self.endpoint))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request);

        let body = send(NAME, &self.model, builder).await?;
        let response: MessagesResponse = decode(NAME, &body)?;

        response
            .content
            .into_iter()
            .find_map(|block| block.text)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| empty_result(NAME))
    }
}
