//! Stage lifecycle: turning a planned stage into a branch plus worktree.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::errors::{Result, StackError};
use crate::fs::StateDir;
use crate::git::Vcs;
use crate::models::{Stack, Stage};

/// What [`start_stage`] did for the stage it started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageCheckout {
    pub stage_id: String,
    pub branch: String,
    pub worktree: PathBuf,
    pub parent: String,
    pub created_branch: bool,
    pub created_worktree: bool,
}

/// Branch a stage builds on.
///
/// The first stage builds on the default branch. Later stages build on the
/// previous stage's branch, which must already exist.
pub fn parent_branch_for_stage(stack: &Stack, index: usize, vcs: &dyn Vcs) -> Result<String> {
    if index == 0 {
        return vcs.default_branch();
    }

    let previous = &stack.stages[index - 1];
    let branch = stack.stage_branch(index - 1);
    if !vcs.branch_exists(&branch) {
        return Err(StackError::PreviousStageNotStarted {
            branch,
            stage: previous.id.clone(),
        });
    }
    Ok(branch)
}

/// Make sure the stage's worktree exists, creating it if missing.
///
/// Uses the recorded worktree path when there is one, otherwise the
/// deterministic `.m/stacks/<stack>/<stage>` path. Returns the path and
/// whether it was created.
pub fn ensure_stage_worktree(
    stack_name: &str,
    stage: &Stage,
    branch: &str,
    vcs: &dyn Vcs,
    state_dir: &StateDir,
) -> Result<(PathBuf, bool)> {
    let worktree = match stage.recorded_worktree() {
        Some(path) => path.to_path_buf(),
        None => state_dir.stage_worktree_path(stack_name, &stage.id),
    };

    if worktree.exists() {
        debug!(worktree = %worktree.display(), "reusing worktree");
        return Ok((worktree, false));
    }

    vcs.add_worktree(&worktree, branch)?;
    Ok((worktree, true))
}

/// Start (or resume) the stage at `index`.
///
/// Creates the branch from its parent if absent and the worktree if absent,
/// then records branch, worktree and parent on the stage and selects it.
/// Nothing is recorded unless every git step succeeded. Calling this twice
/// is a no-op the second time.
pub fn start_stage(
    stack: &mut Stack,
    index: usize,
    vcs: &dyn Vcs,
    state_dir: &StateDir,
) -> Result<StageCheckout> {
    if index >= stack.stages.len() {
        return Err(StackError::StageOutOfRange {
            index,
            len: stack.stages.len(),
        });
    }

    let branch = stack.stage_branch(index);
    let parent = parent_branch_for_stage(stack, index, vcs)?;

    let created_branch = if vcs.branch_exists(&branch) {
        debug!(branch, "reusing branch");
        false
    } else {
        vcs.create_branch(&branch, &parent)?;
        true
    };

    let (worktree, created_worktree) =
        ensure_stage_worktree(&stack.name, &stack.stages[index], &branch, vcs, state_dir)?;

    let stage = &mut stack.stages[index];
    stage.record_checkout(&branch, &worktree, &parent);
    let stage_id = stage.id.clone();
    stack.current_stage = Some(stage_id.clone());

    info!(stack = %stack.name, stage = %stage_id, branch, parent, "stage started");
    Ok(StageCheckout {
        stage_id,
        branch,
        worktree,
        parent,
        created_branch,
        created_worktree,
    })
}

/// Prompt handed to the interactive tool when moving on to a stage.
pub fn stage_start_prompt(stage: &Stage) -> String {
    let mut prompt = format!("Implement stage {}", stage.id);
    let title = stage.title.trim();
    if !title.is_empty() {
        prompt.push_str(&format!(": {title}"));
    }
    if let Some(context) = stage.context_text() {
        prompt.push_str(&format!("\n\nStage context:\n{context}"));
    }
    prompt
}
