//! Settings resolution: CLI flag, then environment, then `~/.commitgen.json`, then defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::changes::{CollectOptions, DEFAULT_MAX_CONTENT_BYTES};
use crate::error::ConfigError;
use crate::llm::{ProviderConfig, ProviderKind, get_timeout};

pub const CONFIG_FILE_NAME: &str = ".commitgen.json";

pub const ENV_BASE_URL: &str = "COMMITAI_BASE_URL";
pub const ENV_API_KEY: &str = "COMMITAI_API_KEY";
pub const ENV_MODEL: &str = "COMMITAI_MODEL";
pub const ENV_PROVIDER: &str = "COMMITAI_PROVIDER";
pub const ENV_ANTHROPIC_KEY: &str = "COMMITAI_ANTHROPIC_KEY";
pub const ENV_GEMINI_KEY: &str = "COMMITAI_GEMINI_KEY";

const DEFAULT_RECENT_COMMITS: usize = 10;
const DEFAULT_MAX_FILES: usize = 10;
const DEFAULT_TEMPERATURE: f64 = 0.2;

/// Contents of the JSON config file. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub provider: Option<String>,
    pub anthropic_key: Option<String>,
    pub gemini_key: Option<String>,
    pub prompt_template: Option<String>,
    pub ignored_files: Vec<String>,
    pub recent_n: Option<usize>,
    pub max_files: Option<usize>,
    pub summarize: Option<bool>,
    pub temperature: Option<f64>,
    pub conventional: Option<bool>,
    pub max_content_bytes: Option<usize>,
}

/// Values given on the command line; `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub provider: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub anthropic_key: Option<String>,
    pub gemini_key: Option<String>,
    pub recent: Option<usize>,
    pub max_files: Option<usize>,
    pub summarize: Option<bool>,
    pub temperature: Option<f64>,
    pub conventional: Option<bool>,
    pub prompt_template: Option<String>,
    pub ignore: Vec<String>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub provider: ProviderKind,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub anthropic_key: Option<String>,
    pub gemini_key: Option<String>,
    pub model: Option<String>,
    pub recent_commits: usize,
    pub max_files: usize,
    pub summarize: bool,
    pub temperature: f64,
    pub conventional: bool,
    pub prompt_template: Option<String>,
    /// File patterns followed by CLI patterns; built-in defaults are added later.
    pub ignore_patterns: Vec<String>,
    pub max_content_bytes: usize,
}

/// Default config file location in the home directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_FILE_NAME))
}

/// Load the config file at `path`, or the default location when `path` is `None`.
///
/// A missing file yields an empty config; unreadable or malformed files are errors.
pub fn load_file_config(path: Option<&Path>) -> Result<FileConfig, ConfigError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) => p,
            None => return Ok(FileConfig::default()),
        },
    };

    let content = match fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No config file at {}", path.display());
            return Ok(FileConfig::default());
        }
        Err(source) => return Err(ConfigError::ReadFile { path, source }),
    };

    debug!("Loaded config file {}", path.display());
    serde_json::from_str(&content).map_err(|source| ConfigError::ParseFile { path, source })
}

/// Non-empty, trimmed value of an environment variable.
fn env_value(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// First present, non-blank value among flag, environment and file.
fn pick(flag: &Option<String>, env_key: &str, file: &Option<String>) -> Option<String> {
    let non_blank = |v: &Option<String>| {
        v.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    non_blank(flag)
        .or_else(|| env_value(env_key))
        .or_else(|| non_blank(file))
}

/// Merge CLI overrides, environment and file config into [`Settings`].
pub fn resolve(overrides: &Overrides, file: &FileConfig) -> Result<Settings, ConfigError> {
    let provider = match pick(&overrides.provider, ENV_PROVIDER, &file.provider) {
        Some(name) => name.parse()?,
        None => ProviderKind::default(),
    };

    let mut ignore_patterns = file.ignored_files.clone();
    ignore_patterns.extend(overrides.ignore.iter().cloned());

    Ok(Settings {
        provider,
        base_url: pick(&overrides.base_url, ENV_BASE_URL, &file.base_url),
        api_key: pick(&overrides.api_key, ENV_API_KEY, &file.api_key),
        anthropic_key: pick(&overrides.anthropic_key, ENV_ANTHROPIC_KEY, &file.anthropic_key),
        gemini_key: pick(&overrides.gemini_key, ENV_GEMINI_KEY, &file.gemini_key),
        model: pick(&overrides.model, ENV_MODEL, &file.model),
        recent_commits: overrides
            .recent
            .or(file.recent_n)
            .unwrap_or(DEFAULT_RECENT_COMMITS),
        max_files: overrides
            .max_files
            .or(file.max_files)
            .unwrap_or(DEFAULT_MAX_FILES),
        summarize: overrides.summarize.or(file.summarize).unwrap_or(false),
        temperature: overrides
            .temperature
            .or(file.temperature)
            .unwrap_or(DEFAULT_TEMPERATURE),
        conventional: overrides.conventional.or(file.conventional).unwrap_or(false),
        prompt_template: overrides
            .prompt_template
            .clone()
            .or_else(|| file.prompt_template.clone())
            .filter(|t| !t.trim().is_empty()),
        ignore_patterns,
        max_content_bytes: file
            .max_content_bytes
            .unwrap_or(DEFAULT_MAX_CONTENT_BYTES),
    })
}

/// Read a custom instructions file; no path means no instructions.
pub fn read_instructions(path: Option<&Path>) -> Result<Option<String>, ConfigError> {
    let Some(path) = path else {
        return Ok(None);
    };
    fs::read_to_string(path)
        .map(Some)
        .map_err(|source| ConfigError::ReadInstructions {
            path: path.to_path_buf(),
            source,
        })
}

impl Settings {
    /// Connection parameters for the selected provider, with its matching credential.
    pub fn provider_config(&self) -> ProviderConfig {
        let api_key = match self.provider {
            ProviderKind::OpenAi | ProviderKind::Ollama => self.api_key.clone(),
            ProviderKind::Anthropic => self.anthropic_key.clone(),
            ProviderKind::Gemini => self.gemini_key.clone(),
        };
        ProviderConfig {
            base_url: self.base_url.clone(),
            api_key,
            model: self.model.clone().unwrap_or_default(),
            timeout: get_timeout(),
        }
    }

    pub fn collect_options(&self, custom_instructions: Option<String>) -> CollectOptions {
        CollectOptions {
            recent_commits: self.recent_commits,
            max_files: self.max_files,
            summarize: self.summarize,
            ignore_patterns: self.ignore_patterns.clone(),
            max_content_bytes: self.max_content_bytes,
            custom_instructions,
            system_prompt_template: self.prompt_template.clone(),
        }
    }
}
