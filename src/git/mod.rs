//! Git operations for stacked stage management
//!
//! This module provides:
//! - Repository discovery and default-branch detection
//! - Branch creation, deletion and ancestry queries
//! - Worktree creation, removal, listing and pruning
//! - The [`Vcs`] capability the engine is written against

pub mod branch;
pub mod driver;
pub mod repo;
pub mod runner;
pub mod worktree;

pub use driver::{GitCli, Vcs};
pub use repo::{discover_repo, shared_root, RepoInfo};
