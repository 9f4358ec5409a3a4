//! commitgen - A CLI tool that drafts git commit messages from staged changes.
//!
//! # Overview
//!
//! commitgen gathers the staged diff, the pre-change content of each touched
//! file and recent history, assembles a two-message prompt, and asks a
//! configurable LLM backend (OpenAI-compatible, Ollama, Anthropic or Gemini)
//! for a commit message. The user then commits, edits, regenerates or cancels.

pub mod changes;
pub mod config;
pub mod error;
pub mod git;
pub mod hook;
pub mod llm;
pub mod prompt;
pub mod session;
pub mod ui;

// Re-export commonly used types
pub use changes::{CollectOptions, collect_prompt_data};
pub use config::{FileConfig, Overrides, Settings};
pub use error::{ChangeError, ConfigError, GitError, HookError, ProviderError, SessionError};
pub use git::GitRepo;
pub use llm::{Provider, ProviderKind};
pub use prompt::{NeutralMessage, PromptData, PromptMessages, Role};
pub use session::{Decision, Outcome, SessionOptions, run_session};
