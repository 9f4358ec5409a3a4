//! Read-side git access using git2: repository metadata, history and staged changes.

use std::path::{Path, PathBuf};

use git2::{DiffOptions, ErrorCode, Patch, Repository, Sort, Tree};
use tracing::{debug, warn};

use crate::error::GitError;

/// A staged file and its unified diff against HEAD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedChange {
    pub path: String,
    pub diff: String,
}

/// An opened, non-bare repository rooted at its working directory.
pub struct GitRepo {
    repo: Repository,
    root: PathBuf,
}

impl GitRepo {
    /// Find the repository containing `path` (or the current directory).
    pub fn discover(path: Option<&Path>) -> Result<Self, GitError> {
        let start = path.unwrap_or_else(|| Path::new("."));
        let repo = Repository::discover(start).map_err(GitError::NotARepository)?;
        let root = repo
            .workdir()
            .ok_or(GitError::BareRepository)?
            .to_path_buf();
        let root = root.canonicalize().unwrap_or(root);
        debug!("Resolved repository root: {}", root.display());
        Ok(Self { repo, root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Hooks directory inside the git dir. Linked worktrees resolve to their own git dir.
    pub fn hooks_dir(&self) -> PathBuf {
        self.repo.path().join("hooks")
    }

    /// Repository name, taken from the root directory's base name.
    pub fn name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "repository".to_string())
    }

    /// Current branch name. Detached HEAD reports `HEAD`, like `git rev-parse --abbrev-ref`.
    pub fn current_branch(&self) -> Result<String, GitError> {
        match self.repo.head() {
            Ok(head) if head.is_branch() => {
                Ok(head.shorthand().unwrap_or("HEAD").to_string())
            }
            Ok(_) => Ok("HEAD".to_string()),
            Err(e) if e.code() == ErrorCode::UnbornBranch => {
                let head = self
                    .repo
                    .find_reference("HEAD")
                    .map_err(|e| GitError::Reference("HEAD".to_string(), e))?;
                let target = head.symbolic_target().unwrap_or("HEAD");
                Ok(target
                    .strip_prefix("refs/heads/")
                    .unwrap_or(target)
                    .to_string())
            }
            Err(e) => Err(GitError::Reference("HEAD".to_string(), e)),
        }
    }

    /// Read a string value from the repository's effective git config.
    pub fn config_get(&self, key: &str) -> Option<String> {
        let config = self.repo.config().ok()?;
        config
            .get_string(key)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Subject lines of the `n` most recent commits reachable from HEAD.
    pub fn recent_commits(&self, n: usize) -> Result<Vec<String>, GitError> {
        self.collect_subjects(n, |_| true)
    }

    /// Subject lines of the `n` most recent commits by `author` (matched on email or name).
    ///
    /// Returns an empty list when `n` is zero or the author is blank.
    pub fn recent_commits_by_author(
        &self,
        n: usize,
        author: &str,
    ) -> Result<Vec<String>, GitError> {
        let author = author.trim();
        if author.is_empty() {
            return Ok(Vec::new());
        }
        self.collect_subjects(n, |commit| {
            let signature = commit.author();
            signature.email() == Some(author) || signature.name() == Some(author)
        })
    }

    fn collect_subjects<F>(&self, n: usize, mut keep: F) -> Result<Vec<String>, GitError>
    where
        F: FnMut(&git2::Commit<'_>) -> bool,
    {
        if n == 0 || self.head_tree()?.is_none() {
            return Ok(Vec::new());
        }

        let mut revwalk = self.repo.revwalk().map_err(GitError::Revwalk)?;
        revwalk.push_head().map_err(GitError::Revwalk)?;
        revwalk.set_sorting(Sort::TIME).map_err(GitError::Revwalk)?;

        let mut subjects = Vec::new();
        for oid in revwalk {
            let oid = oid.map_err(GitError::Revwalk)?;
            let commit = self.repo.find_commit(oid).map_err(GitError::Revwalk)?;
            if !keep(&commit) {
                continue;
            }
            let subject = commit.summary().unwrap_or("").trim().to_string();
            if !subject.is_empty() {
                subjects.push(subject);
            }
            if subjects.len() >= n {
                break;
            }
        }

        Ok(subjects)
    }

    /// Staged files (HEAD vs index) with their unified diffs, capped at `limit` files.
    ///
    /// A `limit` of zero falls back to 10.
    pub fn staged_changes(&self, limit: usize) -> Result<Vec<StagedChange>, GitError> {
        let limit = if limit == 0 { 10 } else { limit };
        let head_tree = self.head_tree()?;

        let mut opts = DiffOptions::new();
        let diff = self
            .repo
            .diff_tree_to_index(head_tree.as_ref(), None, Some(&mut opts))
            .map_err(GitError::Diff)?;

        let mut changes = Vec::new();
        for idx in 0..diff.deltas().len() {
            if changes.len() >= limit {
                break;
            }
            let Some(delta) = diff.get_delta(idx) else {
                continue;
            };
            let path = delta
                .new_file()
                .path()
                .or_else(|| delta.old_file().path())
                .map(|p| p.to_string_lossy().to_string())
                .unwrap_or_default();
            if path.is_empty() {
                continue;
            }

            let text = match Patch::from_diff(&diff, idx).map_err(GitError::Diff)? {
                Some(mut patch) => {
                    let buf = patch.to_buf().map_err(GitError::Diff)?;
                    String::from_utf8_lossy(&buf).to_string()
                }
                None => {
                    warn!("No textual diff for {path} (binary file?)");
                    String::new()
                }
            };

            changes.push(StagedChange { path, diff: text });
        }

        Ok(changes)
    }

    /// Content of `rel_path` as committed at HEAD.
    pub fn read_file_at_head(&self, rel_path: &str) -> Result<String, GitError> {
        let read_err = |reason: String| GitError::Read {
            path: format!("HEAD:{rel_path}"),
            reason,
        };

        let tree = self
            .head_tree()?
            .ok_or_else(|| read_err("HEAD has no commits".to_string()))?;
        let entry = tree
            .get_path(Path::new(rel_path))
            .map_err(|e| read_err(e.message().to_string()))?;
        let object = entry
            .to_object(&self.repo)
            .map_err(|e| read_err(e.message().to_string()))?;
        let blob = object
            .as_blob()
            .ok_or_else(|| read_err("not a file".to_string()))?;

        Ok(String::from_utf8_lossy(blob.content()).to_string())
    }

    /// Content of `rel_path` in the working tree.
    pub fn read_working_tree_file(&self, rel_path: &str) -> Result<String, GitError> {
        let path = self.root.join(rel_path);
        std::fs::read(&path)
            .map(|bytes| String::from_utf8_lossy(&bytes).to_string())
            .map_err(|e| GitError::Read {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
    }

    /// Resolve the HEAD tree, distinguishing an unborn branch from real failures.
    fn head_tree(&self) -> Result<Option<Tree<'_>>, GitError> {
        let head = match self.repo.head() {
            Ok(r) => r,
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                return Ok(None);
            }
            Err(e) => return Err(GitError::Reference("HEAD".to_string(), e)),
        };

        let tree = head
            .peel_to_tree()
            .map_err(|e| GitError::Reference("HEAD".to_string(), e))?;
        Ok(Some(tree))
    }
}
