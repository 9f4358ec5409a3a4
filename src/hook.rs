//! Installation of the `prepare-commit-msg` hook that runs commitgen in hook mode.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::HookError;

const HOOK_NAME: &str = "prepare-commit-msg";

/// Render the hook script invoking `exe`.
///
/// Commits with a message from `-m` or `-F` are left alone; everything else
/// runs commitgen against the message file with the terminal attached.
pub fn hook_script(exe: &str) -> String {
    format!(
        r#"#!/bin/sh
# commitgen hook: generates the commit message for plain `git commit`.

COMMIT_MSG_FILE=$1
COMMIT_SOURCE=$2

if [ "$COMMIT_SOURCE" = "message" ]; then
  exit 0
fi

echo "commitgen is analyzing changes..." > /dev/tty
"{exe}" --hook "$COMMIT_MSG_FILE" < /dev/tty > /dev/tty
"#
    )
}

/// Write the hook into `hooks_dir`, refusing to replace an existing one.
///
/// Returns the path of the installed hook.
pub fn install_hook(hooks_dir: &Path, exe: &str) -> Result<PathBuf, HookError> {
    let hook_path = hooks_dir.join(HOOK_NAME);
    if hook_path.exists() {
        return Err(HookError::AlreadyExists(hook_path));
    }

    let write_err = |source| HookError::WriteFailed {
        path: hook_path.clone(),
        source,
    };

    fs::create_dir_all(hooks_dir).map_err(write_err)?;
    fs::write(&hook_path, hook_script(exe)).map_err(write_err)?;
    make_executable(&hook_path).map_err(write_err)?;

    debug!("Installed hook at {}", hook_path.display());
    Ok(hook_path)
}

/// Absolute path of the running binary, or the bare name when it can't be resolved.
pub fn current_exe() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.canonicalize().ok())
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "commitgen".to_string())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
