//! LLM backends behind one provider capability, plus retry.

pub mod anthropic;
pub mod gemini;
pub mod ollama;
pub mod openai;
pub mod provider;
pub mod retry;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use provider::{
    Provider, ProviderConfig, ProviderKind, build_http_client, build_provider, get_timeout,
};
pub use retry::{MAX_ATTEMPTS, generate_with_retry};
