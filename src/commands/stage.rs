//! `m stage ...`: select, open and publish individual stages.

use anyhow::{bail, Result};

use super::common::{require_stack_with_plan, resolve_stack_name, RepoContext};
use super::output;
use crate::agent::open_agent;
use crate::engine::{publish_batch, stage_indexes_to_push, stage_start_prompt, start_stage};
use crate::errors::StackError;
use crate::git::Vcs;
use crate::models::Stacks;
use crate::pr::require_gh;

/// Which stage `stage open` should start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenTarget {
    /// The stage after the selected one, opened with a start prompt.
    Next,
    /// A stage by id, opened without a prompt.
    Stage(String),
    /// The selected stage, or the first one when nothing is selected.
    Current,
}

impl OpenTarget {
    pub fn from_flags(next: bool, stage: Option<String>) -> Result<Self> {
        let stage = stage.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        match (next, stage) {
            (true, Some(_)) => bail!("--next and --stage cannot be used together"),
            (true, None) => Ok(Self::Next),
            (false, Some(id)) => Ok(Self::Stage(id)),
            (false, None) => Ok(Self::Current),
        }
    }
}

struct Loaded {
    repo: RepoContext,
    stacks: Stacks,
    stack_name: String,
}

fn load_with_plan(stack_override: Option<&str>) -> Result<Loaded> {
    let repo = RepoContext::discover()?;
    let (config, stacks) = repo.load_state()?;
    let stack_name = require_stack_with_plan(&repo, &config, &stacks, stack_override)?;
    Ok(Loaded {
        repo,
        stacks,
        stack_name,
    })
}

pub fn list(stack_override: Option<&str>) -> Result<()> {
    let loaded = load_with_plan(stack_override)?;
    let stack = loaded.stacks.require_stack(&loaded.stack_name)?;

    let current = stack.effective_current_stage(&loaded.repo.worktree);
    for (index, stage) in stack.stages.iter().enumerate() {
        let line = format!("{}. {} - {}", index + 1, stage.id, stage.title);
        if current == Some(stage.id.as_str()) {
            output::current(line);
        } else {
            println!("  {line}");
        }
    }
    Ok(())
}

pub fn select(stage_id: &str, stack_override: Option<&str>) -> Result<()> {
    let stage_id = stage_id.trim();
    let mut loaded = load_with_plan(stack_override)?;
    let stack = loaded.stacks.require_stack_mut(&loaded.stack_name)?;

    if stack.find_stage(stage_id).is_none() {
        return Err(StackError::StageNotFound {
            stage: stage_id.to_string(),
            stack: stack.name.clone(),
        }
        .into());
    }
    stack.current_stage = Some(stage_id.to_string());
    loaded.repo.store().save_stacks(&mut loaded.stacks)?;

    output::current(format!("Current stage: {stage_id}"));
    Ok(())
}

/// Prints nothing when no stage can be determined.
pub fn current(stack_override: Option<&str>) -> Result<()> {
    let repo = RepoContext::discover()?;
    let store = repo.store();
    let config = store.load_config()?;
    let stacks = store.load_stacks()?;

    if let Some((_, stage)) = repo.workspace_stack_stage(&stacks) {
        output::current(format!("Current stage: {stage}"));
        return Ok(());
    }
    if repo.is_linked_worktree() && stack_override.is_none() {
        return Ok(());
    }

    let Some(name) = resolve_stack_name(&repo, &config, &stacks, stack_override)? else {
        return Ok(());
    };
    let stage = stacks
        .find_stack(&name)
        .and_then(|stack| stack.effective_current_stage(&repo.worktree));
    if let Some(stage) = stage {
        output::current(format!("Current stage: {stage}"));
    }
    Ok(())
}

pub fn open(target: OpenTarget, no_open: bool, stack_override: Option<&str>) -> Result<()> {
    let mut loaded = load_with_plan(stack_override)?;
    let stack = loaded.stacks.require_stack_mut(&loaded.stack_name)?;

    let (index, with_prompt) = match &target {
        OpenTarget::Next => (stack.next_stage_index()?, true),
        OpenTarget::Stage(id) => {
            let (index, _) = stack.find_stage(id).ok_or_else(|| StackError::StageNotFound {
                stage: id.clone(),
                stack: stack.name.clone(),
            })?;
            (index, false)
        }
        OpenTarget::Current => {
            let index = stack
                .effective_current_stage(&loaded.repo.worktree)
                .and_then(|id| stack.find_stage(id))
                .map_or(0, |(index, _)| index);
            (index, false)
        }
    };

    let store = loaded.repo.store();
    let vcs = loaded.repo.vcs();
    let checkout = start_stage(stack, index, &vcs, store.dir())?;
    let prompt = with_prompt.then(|| stage_start_prompt(&stack.stages[index]));
    let stack_name = stack.name.clone();

    if checkout.created_branch {
        output::success(format!(
            "Created branch {} from {}",
            checkout.branch, checkout.parent
        ));
    } else {
        output::reuse(format!("Reusing branch {}", checkout.branch));
    }
    if checkout.created_worktree {
        output::success(format!("Created worktree: {}", checkout.worktree.display()));
    } else {
        output::reuse(format!("Reusing worktree: {}", checkout.worktree.display()));
    }

    store.save_stacks(&mut loaded.stacks)?;

    output::current(format!("Current stack: {stack_name}"));
    output::current(format!("Current stage: {}", checkout.stage_id));

    if no_open {
        return Ok(());
    }
    open_agent(&checkout.worktree, prompt.as_deref())?;
    Ok(())
}

pub fn push(stack_override: Option<&str>) -> Result<()> {
    require_gh("stage push")?;

    let loaded = load_with_plan(stack_override)?;
    let repo = &loaded.repo;
    let stack = loaded.stacks.require_stack(&loaded.stack_name)?;

    let current_id = stack
        .effective_current_stage(&repo.worktree)
        .ok_or(StackError::NoStageSelected)?;
    let (current_index, _) =
        stack
            .find_stage(current_id)
            .ok_or_else(|| StackError::StageNotFound {
                stage: current_id.to_string(),
                stack: stack.name.clone(),
            })?;

    let vcs = repo.vcs();
    let prs = repo.prs();
    let mut indexes =
        stage_indexes_to_push(stack, current_index, |branch| vcs.remote_branch_exists(branch))?;
    indexes.push(current_index);

    let report = publish_batch(stack, &indexes, false, &vcs, &prs, |outcome| {
        if let Some(base) = &outcome.pushed_base {
            output::action(format!("Pushed base branch {base}"));
        }
        if outcome.created {
            output::success(format!("Created PR for {}", outcome.stage_id));
        } else {
            output::action(format!("Updated PR for {}", outcome.stage_id));
        }
        output::link(&outcome.pr_url);
    })?;

    if !report.synced.is_empty() {
        output::info(format!(
            "Updated {} PR description(s)",
            report.synced.len()
        ));
    }
    Ok(())
}
