//! Commit execution through the system `git` binary.
//!
//! Shelling out keeps the user's hooks, signing configuration and identity in play,
//! which git2's commit API would bypass.

use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::error::GitError;

/// Record the staged changes in `root` with `message`.
///
/// Blank messages are rejected before git is ever invoked.
pub fn commit(root: &Path, message: &str) -> Result<(), GitError> {
    let message = message.trim();
    if message.is_empty() {
        return Err(GitError::EmptyMessage);
    }

    which::which("git").map_err(|_| GitError::GitNotInstalled)?;

    debug!("Committing in {} ({} bytes)", root.display(), message.len());
    run_git(root, &["commit", "-m", message], "commit")
}

/// Run a git command in `root` and return success or a descriptive error.
fn run_git(root: &Path, args: &[&str], operation: &str) -> Result<(), GitError> {
    let output = Command::new("git")
        .arg("-C")
        .arg(root)
        .args(args)
        .output()
        .map_err(|e| GitError::CommandFailed {
            operation: operation.to_string(),
            stderr: e.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        // `git commit` reports "nothing to commit" on stdout.
        let detail = if stderr.trim().is_empty() {
            stdout.trim().to_string()
        } else {
            stderr.trim().to_string()
        };
        return Err(GitError::CommandFailed {
            operation: operation.to_string(),
            stderr: detail,
        });
    }

    Ok(())
}
