//! The provider capability, backend selection and shared HTTP plumbing.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

use crate::error::{ConfigError, ProviderError};
use crate::prompt::NeutralMessage;

use super::{AnthropicProvider, GeminiProvider, OllamaProvider, OpenAiProvider};

/// Environment variable overriding the HTTP request timeout, in seconds.
pub const TIMEOUT_ENV_VAR: &str = "COMMITGEN_HTTP_TIMEOUT";

/// Default HTTP request timeout (60 seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// A text-generation backend.
///
/// Each implementation translates neutral messages into its own wire format
/// and returns the raw response text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Provider: Send + Sync {
    /// Short backend name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Send `messages` and return the model's raw text.
    async fn generate(
        &self,
        messages: &[NeutralMessage],
        temperature: f64,
    ) -> Result<String, ProviderError>;
}

/// Supported backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Ollama,
    Anthropic,
    Gemini,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Ollama => "ollama",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Gemini => "gemini",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    /// Case-insensitive; an empty string selects OpenAI.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" | "" => Ok(ProviderKind::OpenAi),
            "ollama" => Ok(ProviderKind::Ollama),
            "anthropic" => Ok(ProviderKind::Anthropic),
            "gemini" => Ok(ProviderKind::Gemini),
            _ => Err(ConfigError::UnknownProvider(s.to_string())),
        }
    }
}

/// Connection parameters for one backend.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

impl ProviderConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            base_url: None,
            api_key: None,
            model: model.into(),
            timeout: get_timeout(),
        }
    }

    fn key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    fn base_url(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }
}

/// HTTP timeout from the environment, falling back to the default on bad input.
pub fn get_timeout() -> Duration {
    match env::var(TIMEOUT_ENV_VAR) {
        Ok(v) if !v.is_empty() => match v.parse::<u64>() {
            Ok(secs) => Duration::from_secs(secs),
            Err(_) => {
                warn!(
                    "Invalid {} value '{}', using default {}s",
                    TIMEOUT_ENV_VAR, v, DEFAULT_TIMEOUT_SECS
                );
                Duration::from_secs(DEFAULT_TIMEOUT_SECS)
            }
        },
        _ => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
    }
}

/// Validate `config` for `kind` and construct the matching adapter.
pub fn build_provider(
    kind: ProviderKind,
    config: &ProviderConfig,
) -> Result<Box<dyn Provider>, ConfigError> {
    let model = config.model.trim();
    if model.is_empty() {
        return Err(ConfigError::MissingModel);
    }

    let client = build_http_client(config.timeout)?;
    debug!("Using provider {kind} with model {model}");

    let provider: Box<dyn Provider> = match kind {
        ProviderKind::OpenAi => {
            let mut provider = OpenAiProvider::new(client, model);
            if let Some(url) = config.base_url() {
                provider = provider.with_endpoint(url);
            }
            if let Some(key) = config.key() {
                provider = provider.with_api_key(key);
            }
            Box::new(provider)
        }
        ProviderKind::Ollama => {
            let mut provider = OllamaProvider::new(client, model);
            if let Some(url) = config.base_url() {
                provider = provider.with_endpoint(url);
            }
            Box::new(provider)
        }
        ProviderKind::Anthropic => {
            let key = config.key().ok_or(ConfigError::MissingCredential {
                provider: kind.to_string(),
                flag: "anthropic-key",
                env: "COMMITAI_ANTHROPIC_KEY",
            })?;
            let mut provider = AnthropicProvider::new(client, model, key);
            if let Some(url) = config.base_url() {
                provider = provider.with_endpoint(url);
            }
            Box::new(provider)
        }
        ProviderKind::Gemini => {
            let key = config.key().ok_or(ConfigError::MissingCredential {
                provider: kind.to_string(),
                flag: "gemini-key",
                env: "COMMITAI_GEMINI_KEY",
            })?;
            let mut provider = GeminiProvider::new(client, model, key);
            if let Some(url) = config.base_url() {
                provider = provider.with_endpoint(url);
            }
            Box::new(provider)
        }
    };

    Ok(provider)
}

/// Build the async HTTP client shared by every request of a run.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, ConfigError> {
    let mut builder = reqwest::Client::builder();
    if !timeout.is_zero() {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| ConfigError::HttpClient(e.to_string()))
}

/// Send a prepared request and return the body of a successful response.
///
/// Transport failures and non-success statuses are logged and mapped onto
/// [`ProviderError`].
pub(crate) async fn send(
    provider: &'static str,
    model: &str,
    request: reqwest::RequestBuilder,
) -> Result<String, ProviderError> {
    let response = request.send().await.map_err(|e| {
        let error_kind = if e.is_timeout() {
            "timeout"
        } else if e.is_connect() {
            "connect"
        } else if e.is_request() {
            "request"
        } else {
            "unknown"
        };
        error!(
            provider,
            model = %model,
            error = %e,
            error_kind,
            "LLM request failed"
        );
        ProviderError::Transport {
            provider: provider.to_string(),
            reason: format!("{error_kind} error: {e}"),
        }
    })?;

    let status = response.status();
    let body = response.text().await.map_err(|e| ProviderError::Transport {
        provider: provider.to_string(),
        reason: format!("failed to read response body: {e}"),
    })?;

    if !status.is_success() {
        error!(
            provider,
            model = %model,
            status = %status,
            body = %body,
            "LLM API returned error status"
        );
        return Err(ProviderError::Status {
            provider: provider.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    Ok(body)
}

/// Decode a JSON response body.
pub(crate) fn decode<T: DeserializeOwned>(
    provider: &'static str,
    body: &str,
) -> Result<T, ProviderError> {
    serde_json::from_str(body).map_err(|e| ProviderError::Decode {
        provider: provider.to_string(),
        reason: e.to_string(),
    })
}

pub(crate) fn empty_result(provider: &'static str) -> ProviderError {
    ProviderError::EmptyResult {
        provider: provider.to_string(),
    }
}

/// Strip trailing slashes so paths can be appended with a single `/`.
pub(crate) fn trim_endpoint(endpoint: &str) -> String {
    endpoint.trim_end_matches('/').to_string()
}
