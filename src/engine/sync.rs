//! Stack sync: prune merged stages and rebase the remaining chain.
//!
//! One pass, in stage order. A running `current_parent` starts at the
//! default branch and becomes each rebased stage's branch, so every stage is
//! replayed onto its true parent even after earlier stages were merged.
//!
//! When a stage's previous stage has merged, its branch still carries that
//! stage's original commits while the default branch holds them in
//! squashed or rebased form. Those stages are rebased with
//! `--onto <current_parent> <old upstream>` so only their own commits are
//! replayed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::lifecycle::ensure_stage_worktree;
use super::RebaseMode;
use crate::errors::{Result, StackError};
use crate::fs::StateDir;
use crate::git::branch::remote_tracking_name;
use crate::git::Vcs;
use crate::models::{Stack, Stage};
use crate::pr::PullRequests;

/// Per-stage facts captured before anything is mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncInfo {
    pub index: usize,
    pub branch: String,
    /// Parent in the original order: the default branch for the first
    /// stage, else the previous stage's branch.
    pub old_parent: String,
    /// True for every stage that had a stage as its parent.
    pub parent_merged: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebasedStage {
    pub stage_id: String,
    pub branch: String,
    pub onto: String,
    pub mode: RebaseMode,
    /// Upstream boundary of a transplant rebase.
    pub upstream: Option<String>,
}

/// Outcome of [`sync_stack`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub rebased: Vec<RebasedStage>,
    /// Ids of stages removed because their PR merged.
    pub pruned: Vec<String>,
    pub created_worktrees: Vec<PathBuf>,
    /// Non-fatal problems the user should see.
    pub warnings: Vec<String>,
    /// True when the stack changed and must be saved.
    pub mutated: bool,
}

pub fn build_sync_infos(stack: &Stack, default_branch: &str) -> Vec<SyncInfo> {
    (0..stack.stages.len())
        .map(|index| {
            let (old_parent, parent_merged) = if index == 0 {
                (default_branch.trim().to_string(), false)
            } else {
                (stack.stage_branch(index - 1), true)
            };
            SyncInfo {
                index,
                branch: stack.stage_branch(index),
                old_parent,
                parent_merged,
            }
        })
        .collect()
}

/// Whether a stage needs a transplant rather than a plain rebase.
///
/// Only when pruning, the stage's original parent was a stage, that parent
/// has merged, and the running parent has actually moved away from it.
pub fn should_transplant(
    info: &SyncInfo,
    prune: bool,
    merged: &HashMap<String, bool>,
    current_parent: &str,
) -> bool {
    if !prune || !info.parent_merged {
        return false;
    }
    let old_parent = info.old_parent.trim();
    if old_parent.is_empty() || current_parent.trim() == old_parent {
        return false;
    }
    merged.get(&info.old_parent).copied().unwrap_or(false)
}

/// Find the commit to transplant from.
///
/// Tries the old parent, then its remote-tracking branch. A candidate that
/// is still an ancestor of the stage branch is used as-is; a diverged one
/// falls back to its merge base with the stage branch. `Ok(None)` when
/// nothing resolves; failing to query git is an error.
pub fn resolve_transplant_upstream(
    vcs: &dyn Vcs,
    stage_branch: &str,
    old_parent: &str,
) -> Result<Option<String>> {
    let parent = old_parent.trim();
    if parent.is_empty() {
        return Ok(None);
    }

    for candidate in [parent.to_string(), remote_tracking_name(parent)] {
        if !vcs.commit_exists(&candidate)? {
            continue;
        }
        if vcs.is_ancestor(&candidate, stage_branch)? {
            debug!(candidate, stage_branch, "upstream is an ancestor");
            return Ok(Some(candidate));
        }
        if let Some(base) = vcs.merge_base(&candidate, stage_branch)? {
            let base = base.trim();
            if !base.is_empty() {
                debug!(candidate, base, "upstream diverged, using merge base");
                return Ok(Some(base.to_string()));
            }
        }
    }
    Ok(None)
}

/// Run a rebase in `worktree`; on failure issue exactly one `rebase --abort`.
///
/// The returned error says whether the abort succeeded. A failed abort is
/// [`StackError::RebaseAbortFailed`] and needs manual recovery.
pub fn run_rebase_with_abort(
    vcs: &dyn Vcs,
    worktree: &Path,
    rebase_args: &[&str],
    stage_id: &str,
    branch: &str,
    mode: RebaseMode,
) -> Result<()> {
    let Err(rebase_error) = vcs.run_in(worktree, rebase_args) else {
        return Ok(());
    };

    warn!(stage = stage_id, branch, %mode, "rebase failed, aborting");
    match vcs.run_in(worktree, &["rebase", "--abort"]) {
        Ok(_) => Err(StackError::RebaseAborted {
            stage: stage_id.to_string(),
            branch: branch.to_string(),
            mode,
            worktree: worktree.to_path_buf(),
            source: Box::new(rebase_error),
        }),
        Err(abort_error) => Err(StackError::RebaseAbortFailed {
            stage: stage_id.to_string(),
            branch: branch.to_string(),
            mode,
            worktree: worktree.to_path_buf(),
            source: Box::new(rebase_error),
            abort_error: Box::new(abort_error),
        }),
    }
}

/// Remove every stage whose branch `is_merged` reports, running `cleanup`
/// for each before it is dropped.
///
/// If the selected stage was pruned, selection moves to the stage that
/// followed it when one survives, else to the last remaining stage, else it
/// is cleared. Returns the ids of pruned stages.
pub fn prune_merged_stages(
    stack: &mut Stack,
    is_merged: impl Fn(&str) -> bool,
    mut cleanup: impl FnMut(&Stage, &str) -> Result<()>,
) -> Result<Vec<String>> {
    let current = stack.selected_stage().map(str::to_string);
    let mut remaining = Vec::with_capacity(stack.stages.len());
    let mut pruned = Vec::new();
    let mut preferred_index = None;
    let mut current_survives = false;

    for (index, stage) in stack.stages.iter().enumerate() {
        let branch = stack.stage_branch(index);
        let is_current = current.as_deref() == Some(stage.id.as_str());

        if is_merged(&branch) {
            cleanup(stage, &branch)?;
            if is_current {
                preferred_index = Some(remaining.len());
            }
            pruned.push(stage.id.clone());
            continue;
        }

        if is_current {
            current_survives = true;
        }
        remaining.push(stage.clone());
    }

    if pruned.is_empty() {
        return Ok(pruned);
    }

    stack.stages = remaining;
    if !current_survives {
        stack.current_stage = match preferred_index {
            _ if stack.stages.is_empty() => None,
            Some(i) if i < stack.stages.len() => Some(stack.stages[i].id.clone()),
            _ => stack.stages.last().map(|s| s.id.clone()),
        };
    }
    Ok(pruned)
}

/// Reconcile `stack` against merged PRs and the moving default branch.
///
/// With `prune` set, merge status is queried once per stage branch, merged
/// stages are skipped by the rebase loop and then removed along with their
/// worktree and local branch. Stages whose branch does not exist are left
/// alone. A failed rebase is aborted and returned as an error; the failing
/// stage's record is untouched.
pub fn sync_stack(
    stack: &mut Stack,
    default_branch: &str,
    prune: bool,
    vcs: &dyn Vcs,
    prs: &dyn PullRequests,
    state_dir: &StateDir,
) -> Result<SyncReport> {
    let infos = build_sync_infos(stack, default_branch);

    let mut merged: HashMap<String, bool> = HashMap::new();
    if prune {
        for info in &infos {
            if merged.contains_key(&info.branch) {
                continue;
            }
            let is_merged = prs.is_merged(&info.branch)?;
            debug!(branch = %info.branch, is_merged, "merge probe");
            merged.insert(info.branch.clone(), is_merged);
        }
    }
    let is_merged = |branch: &str| merged.get(branch).copied().unwrap_or(false);

    let mut report = SyncReport::default();
    let mut current_parent = default_branch.to_string();

    for info in &infos {
        if prune && is_merged(&info.branch) {
            continue;
        }
        if !vcs.branch_exists(&info.branch) {
            debug!(branch = %info.branch, "branch not started, skipping");
            continue;
        }

        let stage = &stack.stages[info.index];
        let (worktree, created) =
            ensure_stage_worktree(&stack.name, stage, &info.branch, vcs, state_dir)?;
        if created {
            report.created_worktrees.push(worktree.clone());
            report.mutated = true;
        }

        let mut mode = RebaseMode::Plain;
        let mut upstream = None;
        if should_transplant(info, prune, &merged, &current_parent) {
            match resolve_transplant_upstream(vcs, &info.branch, &info.old_parent)? {
                Some(resolved) => {
                    mode = RebaseMode::Transplant;
                    upstream = Some(resolved);
                }
                None => {
                    let message = format!(
                        "Could not resolve upstream {} for {}; falling back to plain rebase onto {}",
                        info.old_parent, info.branch, current_parent
                    );
                    warn!("{message}");
                    report.warnings.push(message);
                }
            }
        }

        let args: Vec<&str> = match upstream.as_deref() {
            Some(upstream) => vec!["rebase", "--onto", current_parent.as_str(), upstream],
            None => vec!["rebase", current_parent.as_str()],
        };
        info!(branch = %info.branch, onto = %current_parent, %mode, "rebasing stage");
        run_rebase_with_abort(vcs, &worktree, &args, &stage.id, &info.branch, mode)?;

        let stage = &mut stack.stages[info.index];
        stage.record_checkout(&info.branch, &worktree, &current_parent);
        report.rebased.push(RebasedStage {
            stage_id: stage.id.clone(),
            branch: info.branch.clone(),
            onto: current_parent.clone(),
            mode,
            upstream,
        });
        report.mutated = true;
        current_parent = info.branch.clone();
    }

    if prune {
        report.pruned = prune_merged_stages(stack, is_merged, |stage, branch| {
            cleanup_stage(vcs, stage, branch)
        })?;
        if !report.pruned.is_empty() {
            info!(stack = %stack.name, pruned = ?report.pruned, "pruned merged stages");
            report.mutated = true;
        }
    }

    Ok(report)
}

/// Remove a pruned stage's worktree and local branch; absent ones are skipped.
fn cleanup_stage(vcs: &dyn Vcs, stage: &Stage, branch: &str) -> Result<()> {
    if let Some(worktree) = stage.recorded_worktree() {
        if worktree.exists() {
            vcs.remove_worktree(worktree)?;
        }
    }
    if vcs.branch_exists(branch) {
        vcs.delete_branch(branch)?;
    }
    Ok(())
}
