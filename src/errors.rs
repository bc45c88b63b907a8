//! Typed error hierarchy for stack orchestration.
//!
//! Variants fall into four groups:
//! - lookups that found nothing (stack, stage, inferred stack)
//! - preconditions that reject an operation before anything is mutated
//! - external tool failures (git, gh, the interactive agent)
//! - rebase recovery outcomes, which carry the worktree that needs attention

use std::path::PathBuf;

use thiserror::Error;

use crate::engine::RebaseMode;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, StackError>;

#[derive(Debug, Error)]
pub enum StackError {
    #[error("stack {name:?} not found")]
    StackNotFound { name: String },

    #[error("stage {stage:?} not found in stack {stack:?}")]
    StageNotFound { stage: String, stack: String },

    #[error(
        "could not infer stack from workspace; run from .m/stacks/<stack> \
         (or .m/stacks/<stack>/<stage>), pass --stack, or run: m stack select <stack-name>"
    )]
    NoStackInferred,

    #[error("stage index {index} out of range (stack has {len} stage(s))")]
    StageOutOfRange { index: usize, len: usize },

    #[error("previous stage branch {branch:?} does not exist; start stage {stage:?} first")]
    PreviousStageNotStarted { branch: String, stage: String },

    #[error("stage branch {branch:?} does not exist; run: m stage open --next")]
    StageNotStarted { branch: String },

    #[error("no stage selected; run: m stage select <stage-id>")]
    NoStageSelected,

    #[error("already at final stage {stage:?}")]
    AlreadyAtFinalStage { stage: String },

    #[error("no plan attached to stack {stack:?}; run: m stack attach-plan <plan-file>")]
    NoPlanAttached { stack: String },

    #[error("stack {stack:?} already has an attached plan: {plan_file}")]
    PlanAlreadyAttached { stack: String, plan_file: String },

    #[error("stack {stack:?} has started stages; rerun with --force")]
    StackHasStartedStages { stack: String },

    #[error("stack {name:?} already exists")]
    StackExists { name: String },

    #[error("invalid stack name: {0}")]
    InvalidStackName(String),

    #[error("branch is required")]
    InvalidBranchName,

    #[error("{tool} not found in PATH; {hint}")]
    ToolMissing { tool: String, hint: String },

    /// A subprocess exited non-zero. `command` is the literal command line.
    #[error("{command}: {message}")]
    CommandFailed { command: String, message: String },

    #[error("failed to determine PR URL for {branch} after creation")]
    PrUrlUnresolved { branch: String },

    #[error(
        "rebase failed for stage {stage:?} ({branch}) [{mode}]: {source}\n\
         Aborted rebase in {}; resolve issues and rerun `m stack sync`",
        .worktree.display()
    )]
    RebaseAborted {
        stage: String,
        branch: String,
        mode: RebaseMode,
        worktree: PathBuf,
        #[source]
        source: Box<StackError>,
    },

    #[error(
        "rebase failed for stage {stage:?} ({branch}) [{mode}]: {source}\n\
         Rebase abort also failed in {}: {abort_error}\n\
         Resolve manually in {} (`git rebase --abort`), then rerun `m stack sync`",
        .worktree.display(),
        .worktree.display()
    )]
    RebaseAbortFailed {
        stage: String,
        branch: String,
        mode: RebaseMode,
        worktree: PathBuf,
        #[source]
        source: Box<StackError>,
        abort_error: Box<StackError>,
    },

    #[error("invalid plan: {0}")]
    Plan(String),

    #[error("parse {what}: {source}")]
    Json {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StackError {
    /// True when the rebase could not be rolled back automatically.
    pub fn needs_manual_recovery(&self) -> bool {
        matches!(self, StackError::RebaseAbortFailed { .. })
    }
}
