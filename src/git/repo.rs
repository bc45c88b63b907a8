//! Repository discovery
//!
//! All state lives under the *shared root* so that every linked worktree of
//! a repository sees the same `.m/` directory.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::branch::default_branch;
use super::runner::run_git_checked;
use super::worktree::normalize_path;
use crate::errors::Result;

/// Location facts about the repository containing a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoInfo {
    /// Top level of the worktree the command was run from.
    pub top_level: PathBuf,
    /// Git directory shared by all worktrees (`git rev-parse --git-common-dir`).
    pub common_dir: PathBuf,
    pub default_branch: String,
}

impl RepoInfo {
    pub fn shared_root(&self) -> PathBuf {
        shared_root(&self.top_level, &self.common_dir)
    }

    /// True when the current worktree is a linked worktree rather than the
    /// primary checkout.
    pub fn is_linked_worktree(&self) -> bool {
        let root = self.shared_root();
        normalize_path(&self.top_level) != normalize_path(&root)
    }
}

/// Parent of a common dir named `.git`, else the common dir itself.
///
/// An empty common dir falls back to the top level.
pub fn shared_root(top_level: &Path, common_dir: &Path) -> PathBuf {
    if common_dir.as_os_str().is_empty() {
        return top_level.to_path_buf();
    }
    if common_dir.file_name().is_some_and(|name| name == ".git") {
        if let Some(parent) = common_dir.parent() {
            return parent.to_path_buf();
        }
    }
    common_dir.to_path_buf()
}

/// Discover the repository containing `start`.
pub fn discover_repo(start: &Path) -> Result<RepoInfo> {
    let common = PathBuf::from(run_git_checked(&["rev-parse", "--git-common-dir"], start)?);
    let top_level = run_git_checked(&["rev-parse", "--show-toplevel"], start).map(PathBuf::from);

    let common_dir = if common.is_absolute() {
        common
    } else {
        let base = match &top_level {
            Ok(top) => top.clone(),
            Err(_) => PathBuf::from(run_git_checked(
                &["rev-parse", "--absolute-git-dir"],
                start,
            )?),
        };
        let joined = base.join(&common);
        normalize_path(&joined).unwrap_or(joined)
    };

    let top_level = match top_level {
        Ok(top) => top,
        Err(_) => shared_root(Path::new(""), &common_dir),
    };

    let default_branch = default_branch(start)?;
    debug!(
        top_level = %top_level.display(),
        common_dir = %common_dir.display(),
        default_branch,
        "discovered repository"
    );

    Ok(RepoInfo {
        top_level,
        common_dir,
        default_branch,
    })
}
