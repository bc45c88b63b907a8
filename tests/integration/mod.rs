//! Integration tests for stack orchestration against a real git binary
//!
//! These tests drive repository discovery, stage start, stack sync and
//! worktree cleanup end to end in temporary repositories.

pub mod helpers;
pub mod repo_discovery;
pub mod stack_sync;
pub mod stage_lifecycle;
pub mod worktree_cleanup;
