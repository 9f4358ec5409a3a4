//! Error types for commitgen modules using thiserror.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from git operations.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Not inside a git repository. Use --repo /path/to/repo")]
    NotARepository(#[source] git2::Error),

    #[error("Bare repositories are not supported")]
    BareRepository,

    #[error("Failed to resolve reference '{0}': {1}")]
    Reference(String, #[source] git2::Error),

    #[error("Failed to collect staged diff: {0}")]
    Diff(#[source] git2::Error),

    #[error("Failed to walk commit history: {0}")]
    Revwalk(#[source] git2::Error),

    #[error("Failed to read '{path}': {reason}")]
    Read { path: String, reason: String },

    #[error("Commit message cannot be empty")]
    EmptyMessage,

    #[error("git executable not found in PATH")]
    GitNotInstalled,

    #[error("git {operation} failed: {stderr}")]
    CommandFailed { operation: String, stderr: String },
}

/// Errors raised while turning staged changes into prompt data.
#[derive(Error, Debug)]
pub enum ChangeError {
    #[error("No staged changes. Run: git add -A")]
    NoStagedChanges,

    #[error("All staged files were ignored (checked {checked} files)")]
    AllFilesIgnored { checked: usize },

    #[error(transparent)]
    Git(#[from] GitError),
}

/// Errors from LLM provider backends.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{provider} request failed: {reason}")]
    Transport { provider: String, reason: String },

    #[error("{provider} API error (status {status}): {body}")]
    Status {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("{provider} returned a response that could not be decoded: {reason}")]
    Decode { provider: String, reason: String },

    #[error("{provider} reported an error: {message}")]
    Api { provider: String, message: String },

    #[error("{provider} returned an empty result")]
    EmptyResult { provider: String },

    #[error("Provider still returned no content after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<ProviderError>,
    },
}

impl ProviderError {
    /// Only an empty result is worth asking the backend again for.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::EmptyResult { .. })
    }
}

/// Errors from configuration and environment resolution.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing model. Set --model or env COMMITAI_MODEL")]
    MissingModel,

    #[error("Missing {provider} key. Set --{flag} or env {env}")]
    MissingCredential {
        provider: String,
        flag: &'static str,
        env: &'static str,
    },

    #[error("Unknown provider: {0} (supported: openai, ollama, anthropic, gemini)")]
    UnknownProvider(String),

    #[error("Failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read instructions file {path}: {source}")]
    ReadInstructions {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Errors from the generate / confirm loop.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Terminal interaction failed: {0}")]
    Ui(String),

    #[error(transparent)]
    Commit(#[from] GitError),

    #[error("Failed to write hook file {path}: {source}")]
    WriteHookFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Commit cancelled by user")]
    Cancelled,
}

/// Errors from installing the git hook.
#[derive(Error, Debug)]
pub enum HookError {
    #[error("Hook {0} already exists. Please remove it first")]
    AlreadyExists(PathBuf),

    #[error("Failed to write hook {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
