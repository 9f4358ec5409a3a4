//! Staged change records and the prompt data collected from them.

use std::path::Path;

use glob::Pattern;
use tracing::{debug, warn};

use crate::error::ChangeError;
use crate::git::GitRepo;
use crate::prompt::{FileChange, PromptData, build_attachment};

/// Lock files and generated assets that never help describe a change.
pub const DEFAULT_IGNORES: &[&str] = &[
    "go.sum",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "Cargo.lock",
    "*.map",
    "*.svg",
    "*.min.js",
    "*.min.css",
];

/// Default size ceiling for a single diff or file content (100 KiB).
pub const DEFAULT_MAX_CONTENT_BYTES: usize = 100 * 1024;

/// Bytes kept from text that exceeds the ceiling.
const TRUNCATED_KEEP_BYTES: usize = 2000;

pub const DIFF_TRUNCATED_NOTICE: &str = "...[Diff truncated due to size]...";
pub const CONTENT_TRUNCATED_NOTICE: &str = "...[Content truncated due to size]...";

/// A single staged file: its path, its diff and its content before the change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub path: String,
    pub diff: String,
    pub original_content: String,
}

/// Knobs for [`collect_prompt_data`].
#[derive(Debug, Clone)]
pub struct CollectOptions {
    pub recent_commits: usize,
    pub max_files: usize,
    pub summarize: bool,
    /// Patterns appended to [`DEFAULT_IGNORES`].
    pub ignore_patterns: Vec<String>,
    pub max_content_bytes: usize,
    pub custom_instructions: Option<String>,
    pub system_prompt_template: Option<String>,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            recent_commits: 10,
            max_files: 10,
            summarize: false,
            ignore_patterns: Vec::new(),
            max_content_bytes: DEFAULT_MAX_CONTENT_BYTES,
            custom_instructions: None,
            system_prompt_template: None,
        }
    }
}

/// Whether `path` matches any ignore pattern.
///
/// A pattern matches when it equals the base name, equals the full relative
/// path, or glob-matches the base name. Patterns that are not valid globs only
/// take part in the equality checks.
pub fn should_ignore(path: &str, patterns: &[String]) -> bool {
    let base = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string());

    patterns.iter().any(|pattern| {
        pattern == &base
            || pattern == path
            || Pattern::new(pattern).is_ok_and(|glob| glob.matches(&base))
    })
}

/// Cut `text` to its first ~2000 bytes plus `notice` when it exceeds `ceiling` bytes.
pub fn truncate_oversized(text: &str, ceiling: usize, notice: &str) -> String {
    if text.len() <= ceiling {
        return text.to_string();
    }
    let mut end = TRUNCATED_KEEP_BYTES.min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}\n{notice}", &text[..end])
}

impl ChangeRecord {
    fn into_file_change(self, repo_root: &Path, summarize: bool) -> FileChange {
        let attachment = build_attachment(repo_root, &self.path, &self.original_content, summarize);
        FileChange {
            path: self.path,
            diff: self.diff,
            attachment,
        }
    }
}

/// Gather repository metadata, history and staged files into [`PromptData`].
///
/// Branch, identity and history lookups are best effort and degrade to empty values.
pub fn collect_prompt_data(
    repo: &GitRepo,
    options: &CollectOptions,
) -> Result<PromptData, ChangeError> {
    let repository_name = repo.name();
    let branch_name = repo.current_branch().unwrap_or_else(|e| {
        warn!("Could not resolve current branch: {e}");
        String::new()
    });

    let user_email = repo.config_get("user.email").unwrap_or_default();
    let recent_user_commits = repo
        .recent_commits_by_author(options.recent_commits, &user_email)
        .unwrap_or_else(|e| {
            warn!("Could not read recent user commits: {e}");
            Vec::new()
        });
    let recent_repo_commits = repo
        .recent_commits(options.recent_commits)
        .unwrap_or_else(|e| {
            warn!("Could not read recent repository commits: {e}");
            Vec::new()
        });

    let max_files = options.max_files.max(1);
    let fetch_limit = max_files.saturating_mul(2).max(20);
    let staged = repo.staged_changes(fetch_limit)?;
    if staged.is_empty() {
        return Err(ChangeError::NoStagedChanges);
    }
    let checked = staged.len();

    let ignores: Vec<String> = DEFAULT_IGNORES
        .iter()
        .map(|p| p.to_string())
        .chain(options.ignore_patterns.iter().cloned())
        .collect();

    let mut changes = Vec::with_capacity(max_files.min(checked));
    for change in staged {
        if changes.len() >= max_files {
            break;
        }
        if should_ignore(&change.path, &ignores) {
            debug!("Ignoring {}", change.path);
            continue;
        }

        let record = ChangeRecord {
            diff: truncate_oversized(
                &change.diff,
                options.max_content_bytes,
                DIFF_TRUNCATED_NOTICE,
            ),
            original_content: truncate_oversized(
                &original_content(repo, &change.path),
                options.max_content_bytes,
                CONTENT_TRUNCATED_NOTICE,
            ),
            path: change.path,
        };
        changes.push(record.into_file_change(repo.root(), options.summarize));
    }

    if changes.is_empty() {
        return Err(ChangeError::AllFilesIgnored { checked });
    }

    debug!(
        "Collected {} of {} staged files for the prompt",
        changes.len(),
        checked
    );

    Ok(PromptData {
        repository_name,
        branch_name,
        recent_user_commits,
        recent_repo_commits,
        changes,
        custom_instructions: options.custom_instructions.clone(),
        system_prompt_template: options.system_prompt_template.clone(),
    })
}

/// Content at HEAD, or the working tree file for new files and blank HEAD content.
fn original_content(repo: &GitRepo, path: &str) -> String {
    let at_head = repo.read_file_at_head(path).unwrap_or_default();
    if !at_head.trim().is_empty() {
        return at_head;
    }
    repo.read_working_tree_file(path).unwrap_or_default()
}
