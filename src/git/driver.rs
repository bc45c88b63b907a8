//! Version-control capability used by the orchestration engine
//!
//! The engine never shells out directly; it talks to a [`Vcs`]. [`GitCli`]
//! is the real implementation, tests substitute an in-memory fake to script
//! conflicts and merges.

use std::path::{Path, PathBuf};

use super::branch::{self, REMOTE};
use super::runner::run_git_checked;
use super::worktree;
use crate::errors::Result;

pub trait Vcs {
    fn default_branch(&self) -> Result<String>;

    fn branch_exists(&self, branch: &str) -> bool;

    fn remote_branch_exists(&self, branch: &str) -> bool;

    fn create_branch(&self, branch: &str, from: &str) -> Result<()>;

    fn delete_branch(&self, branch: &str) -> Result<()>;

    /// Check out an existing branch at `path`, copying root `.env` files.
    fn add_worktree(&self, path: &Path, branch: &str) -> Result<()>;

    fn remove_worktree(&self, path: &Path) -> Result<()>;

    /// Run an arbitrary git command in `dir`, returning trimmed stdout.
    fn run_in(&self, dir: &Path, args: &[&str]) -> Result<String>;

    fn commit_exists(&self, rev: &str) -> Result<bool>;

    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool>;

    /// Merge base of two refs, `None` when there is none.
    fn merge_base(&self, a: &str, b: &str) -> Result<Option<String>>;

    fn push(&self, branch: &str, force_with_lease: bool) -> Result<()>;
}

/// [`Vcs`] backed by the `git` binary, rooted at the shared repository root.
#[derive(Debug, Clone)]
pub struct GitCli {
    repo_root: PathBuf,
}

impl GitCli {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
        }
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }
}

impl Vcs for GitCli {
    fn default_branch(&self) -> Result<String> {
        branch::default_branch(&self.repo_root)
    }

    fn branch_exists(&self, name: &str) -> bool {
        branch::branch_exists(name, &self.repo_root)
    }

    fn remote_branch_exists(&self, name: &str) -> bool {
        branch::remote_branch_exists(REMOTE, name, &self.repo_root)
    }

    fn create_branch(&self, name: &str, from: &str) -> Result<()> {
        branch::create_branch(name, from, &self.repo_root)
    }

    fn delete_branch(&self, name: &str) -> Result<()> {
        branch::delete_branch(name, &self.repo_root)
    }

    fn add_worktree(&self, path: &Path, name: &str) -> Result<()> {
        worktree::add_worktree(&self.repo_root, path, name)
    }

    fn remove_worktree(&self, path: &Path) -> Result<()> {
        worktree::remove_worktree(&self.repo_root, path)
    }

    fn run_in(&self, dir: &Path, args: &[&str]) -> Result<String> {
        run_git_checked(args, dir)
    }

    fn commit_exists(&self, rev: &str) -> Result<bool> {
        branch::commit_exists(rev, &self.repo_root)
    }

    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool> {
        branch::is_ancestor(ancestor, descendant, &self.repo_root)
    }

    fn merge_base(&self, a: &str, b: &str) -> Result<Option<String>> {
        branch::merge_base(a, b, &self.repo_root)
    }

    fn push(&self, name: &str, force_with_lease: bool) -> Result<()> {
        branch::push_branch(name, force_with_lease, &self.repo_root)
    }
}
