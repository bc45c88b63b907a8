//! `m stack ...`: create, select, sync and publish whole stacks.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::common::{require_stack_with_plan, RepoContext};
use super::output::{self, plural};
use crate::engine::{publish_batch, started_stage_indexes, sync_stack, RebaseMode};
use crate::errors::StackError;
use crate::git::Vcs;
use crate::models::{Stack, Stage};
use crate::plan::load_plan_stages;
use crate::pr::require_gh;
use crate::validation::validate_stack_name;

/// Parse a plan and return its absolute path with the stages it defines.
fn load_plan(plan_file: &Path) -> Result<(PathBuf, Vec<Stage>)> {
    let absolute = std::path::absolute(plan_file)
        .with_context(|| format!("Failed to resolve plan path: {}", plan_file.display()))?;
    let stages = load_plan_stages(&absolute)
        .with_context(|| format!("Failed to load plan: {}", absolute.display()))?;
    Ok((absolute, stages))
}

pub fn new(name: &str, plan_file: Option<&Path>, stack_type: Option<&str>) -> Result<()> {
    let name = name.trim();
    validate_stack_name(name)?;

    let repo = RepoContext::discover()?;
    let store = repo.store();
    let (mut config, mut stacks) = repo.load_state()?;
    if stacks.find_stack(name).is_some() {
        return Err(StackError::StackExists {
            name: name.to_string(),
        }
        .into());
    }

    let (plan_path, stages) = match plan_file {
        Some(path) => {
            let (absolute, stages) = load_plan(path)?;
            (absolute.to_string_lossy().into_owned(), stages)
        }
        None => (String::new(), Vec::new()),
    };
    let stage_count = stages.len();

    let mut stack = Stack::new(name, plan_path, stages);
    stack.stack_type = stack_type
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);
    stacks.stacks.push(stack);
    store.save_stacks(&mut stacks)?;

    config.current_stack = Some(name.to_string());
    store.save_config(&mut config)?;

    if plan_file.is_some() {
        output::success(format!("Created stack {name:?} with {stage_count} stage(s)"));
    } else {
        output::success(format!("Created stack {name:?} (no plan attached yet)"));
    }
    output::current(format!("Current stack: {name}"));
    Ok(())
}

pub fn attach_plan(plan_file: &Path) -> Result<()> {
    let repo = RepoContext::discover()?;
    let store = repo.store();
    let (config, mut stacks) = repo.load_state()?;

    let name = config
        .selected_stack()
        .ok_or(StackError::NoStackInferred)?
        .to_string();
    let stack = stacks.require_stack_mut(&name)?;
    if !stack.plan_file.trim().is_empty() {
        return Err(StackError::PlanAlreadyAttached {
            stack: stack.name.clone(),
            plan_file: stack.plan_file.clone(),
        }
        .into());
    }

    let (absolute, stages) = load_plan(plan_file)?;
    let stage_count = stages.len();
    stack.plan_file = absolute.to_string_lossy().into_owned();
    stack.stages = stages;
    stack.current_stage = None;
    store.save_stacks(&mut stacks)?;

    output::success(format!(
        "Attached plan to stack {name:?} with {stage_count} stage(s)"
    ));
    output::info(format!("Plan file: {}", absolute.display()));
    Ok(())
}

pub fn remove(name: &str, force: bool, delete_worktrees: bool) -> Result<()> {
    let name = name.trim();
    let repo = RepoContext::discover()?;
    let store = repo.store();
    let (mut config, mut stacks) = repo.load_state()?;

    let stack = stacks.require_stack(name)?;
    if !force && stack.has_started_stages() {
        return Err(StackError::StackHasStartedStages {
            stack: stack.name.clone(),
        }
        .into());
    }

    if delete_worktrees {
        let dir = store.dir().stack_dir(name.trim_matches('/'));
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to remove {}", dir.display()))
            }
        }
        output::cleanup(format!("Removed worktrees: {}", dir.display()));
    }

    let removed = stacks.remove_stack(name)?;
    store.save_stacks(&mut stacks)?;

    if config.selected_stack() == Some(removed.name.as_str()) {
        config.current_stack = None;
        store.save_config(&mut config)?;
    }

    output::success(format!("Removed stack {:?}", removed.name));
    Ok(())
}

pub fn list() -> Result<()> {
    let repo = RepoContext::discover()?;
    let (config, stacks) = repo.load_state()?;

    if stacks.stacks.is_empty() {
        output::info("No stacks found. Create one with `m stack new <name>`");
        return Ok(());
    }

    let selected = config.selected_stack();
    for stack in &stacks.stacks {
        let count = stack.stages.len();
        let line = format!("{}  ·  {count} stage{}", stack.name, plural(count));
        if selected == Some(stack.name.as_str()) {
            output::current(line);
        } else {
            println!("  {line}");
        }
    }
    Ok(())
}

pub fn select(name: &str) -> Result<()> {
    let name = name.trim();
    let repo = RepoContext::discover()?;
    let store = repo.store();
    let (mut config, stacks) = repo.load_state()?;

    stacks.require_stack(name)?;
    config.current_stack = Some(name.to_string());
    store.save_config(&mut config)?;

    output::current(format!("Current stack: {name}"));
    Ok(())
}

/// Prints nothing from a linked worktree that belongs to no stage.
pub fn current() -> Result<()> {
    let repo = RepoContext::discover()?;
    let store = repo.store();
    let config = store.load_config()?;
    let stacks = store.load_stacks()?;

    if let Some((stack, _)) = repo.workspace_stack_stage(&stacks) {
        output::current(format!("Current stack: {stack}"));
        return Ok(());
    }
    if repo.is_linked_worktree() {
        return Ok(());
    }
    if let Some(selected) = config.selected_stack() {
        output::current(format!("Current stack: {selected}"));
    }
    Ok(())
}

pub fn sync(no_prune: bool, stack_override: Option<&str>) -> Result<()> {
    let prune = !no_prune;
    if prune {
        require_gh("stack sync prune mode; rerun with --no-prune to skip merged-stage pruning")?;
    }

    let repo = RepoContext::discover()?;
    let store = repo.store();
    let (config, mut stacks) = repo.load_state()?;
    let name = require_stack_with_plan(&repo, &config, &stacks, stack_override)?;
    let stack = stacks.require_stack_mut(&name)?;

    let vcs = repo.vcs();
    let prs = repo.prs();
    let report = sync_stack(
        stack,
        &repo.default_branch,
        prune,
        &vcs,
        &prs,
        store.dir(),
    )?;

    for path in &report.created_worktrees {
        output::success(format!("Created worktree: {}", path.display()));
    }
    for warning in &report.warnings {
        output::warn(warning);
    }
    for rebased in &report.rebased {
        match (rebased.mode, rebased.upstream.as_deref()) {
            (RebaseMode::Transplant, Some(upstream)) => output::rebase(format!(
                "Transplant rebased {} onto {} (from {upstream})",
                rebased.branch, rebased.onto
            )),
            _ => output::rebase(format!("Rebased {} onto {}", rebased.branch, rebased.onto)),
        }
    }

    if report.mutated {
        store.save_stacks(&mut stacks)?;
    }

    if prune {
        if report.pruned.is_empty() {
            output::info("No merged stage PRs found to prune");
        } else {
            output::success(format!("Pruned {} merged stage(s)", report.pruned.len()));
        }
    }

    if report.rebased.is_empty() {
        output::info("Nothing to rebase (no started stage branches)");
    } else {
        output::success(format!(
            "Synced stack: rebased {} stage branch(es)",
            report.rebased.len()
        ));
    }
    Ok(())
}

pub fn push(stack_override: Option<&str>) -> Result<()> {
    require_gh("stack push")?;

    let repo = RepoContext::discover()?;
    let (config, stacks) = repo.load_state()?;
    let name = require_stack_with_plan(&repo, &config, &stacks, stack_override)?;
    let stack = stacks.require_stack(&name)?;

    let vcs = repo.vcs();
    let prs = repo.prs();
    let indexes = started_stage_indexes(stack, |branch| vcs.branch_exists(branch));
    if indexes.is_empty() {
        output::info("Nothing to push (no started stage branches)");
        return Ok(());
    }

    let report = publish_batch(stack, &indexes, true, &vcs, &prs, |outcome| {
        output::action(format!("{} PR", outcome.stage_id));
        output::link(&outcome.pr_url);
    })?;

    output::action(format!(
        "Pushed {} stage branch(es) with --force-with-lease",
        report.published.len()
    ));
    if !report.synced.is_empty() {
        output::info(format!(
            "Updated {} PR description(s)",
            report.synced.len()
        ));
    }
    Ok(())
}
