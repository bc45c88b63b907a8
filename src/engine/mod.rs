//! Stack orchestration engine
//!
//! - `lifecycle`: starting a stage (branch, worktree, recorded parent)
//! - `sync`: merge-driven pruning and rebasing of a whole stack
//! - `publish`: pushing stage branches and keeping PR descriptions linked
//!
//! The engine only mutates the in-memory [`crate::models::Stack`]; callers
//! persist it once the operation has succeeded.

pub mod lifecycle;
pub mod publish;
pub mod sync;

#[cfg(test)]
pub(crate) mod fakes;

use std::fmt;

pub use lifecycle::{
    ensure_stage_worktree, parent_branch_for_stage, stage_start_prompt, start_stage,
    StageCheckout,
};
pub use publish::{
    collect_stack_pr_urls, publish_batch, publish_stage, render_pr_body, stage_indexes_to_push,
    started_stage_indexes, sync_descriptions, BatchReport, PublishOutcome, SyncedDescription,
};
pub use sync::{sync_stack, RebasedStage, SyncReport};

/// How a stage branch was replayed onto its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebaseMode {
    /// `git rebase <parent>`
    Plain,
    /// `git rebase --onto <parent> <old-upstream>`
    Transplant,
}

impl fmt::Display for RebaseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RebaseMode::Plain => write!(f, "plain"),
            RebaseMode::Transplant => write!(f, "transplant"),
        }
    }
}
