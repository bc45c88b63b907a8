//! `m status`: where am I and what is selected.

use anyhow::Result;

use super::common::RepoContext;
use super::output::{self, yes_no};
use crate::git::branch::current_branch;

pub fn execute() -> Result<()> {
    let repo = RepoContext::discover()?;
    let branch = current_branch(&repo.worktree)?;
    let store = repo.store();
    let initialized = store.dir().exists();
    let config = store.load_config()?;
    let stacks = store.load_stacks()?;

    let workspace = repo.workspace_stack_stage(&stacks);
    let (current_stack, current_stage) = match workspace {
        Some((stack, stage)) => (Some(stack), Some(stage)),
        None => {
            let stack = config.selected_stack();
            let stage = stack
                .and_then(|name| stacks.find_stack(name))
                .and_then(|s| s.effective_current_stage(&repo.worktree));
            (stack, stage)
        }
    };

    output::info(format!("Repo root: {}", repo.root.display()));
    output::info(format!("Worktree: {}", repo.worktree.display()));
    output::info(format!("Branch: {branch}"));
    output::info(format!("m state: {}", yes_no(initialized)));
    output::info(format!(
        "Managed worktrees dir: {}",
        store.dir().worktrees_dir().display()
    ));
    output::info(format!("Stacks: {}", stacks.stacks.len()));

    match current_stack {
        None => {
            output::info("Current stack: (none)");
            output::info("Next: m stack list && m stack select <stack-name>");
        }
        Some(name) => {
            output::current(format!("Current stack: {name}"));
            if let Some(stack) = stacks.find_stack(name) {
                output::info(format!("Stages in current stack: {}", stack.stages.len()));
            }
        }
    }

    match current_stage {
        None => {
            output::info("Current stage: (none)");
            if current_stack.is_some() {
                output::info("Next: m stage list && m stage select <stage-id>");
            }
        }
        Some(stage) => output::current(format!("Current stage: {stage}")),
    }

    if repo.is_linked_worktree() && workspace.is_none() {
        output::info("Linked worktree is not mapped to a stack stage");
    }
    Ok(())
}
