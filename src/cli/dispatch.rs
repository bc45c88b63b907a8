use anyhow::Result;
use mstack::commands::stage::OpenTarget;
use mstack::commands::{init, stack, stage, status, worktree_cmd};

use super::types::{Commands, StackCommands, StageCommands, WorktreeCommands};

pub fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Init => init::execute(),
        Commands::Status => status::execute(),
        Commands::Stack { command } => match command {
            StackCommands::New {
                name,
                plan_file,
                stack_type,
            } => stack::new(&name, plan_file.as_deref(), stack_type.as_deref()),
            StackCommands::AttachPlan { plan_file } => stack::attach_plan(&plan_file),
            StackCommands::Remove {
                name,
                force,
                delete_worktrees,
            } => stack::remove(&name, force, delete_worktrees),
            StackCommands::Sync {
                no_prune,
                stack: stack_name,
            } => stack::sync(no_prune, stack_name.as_deref()),
            StackCommands::Push { stack: stack_name } => stack::push(stack_name.as_deref()),
            StackCommands::List => stack::list(),
            StackCommands::Select { name } => stack::select(&name),
            StackCommands::Current => stack::current(),
        },
        Commands::Stage {
            stack: stack_override,
            command,
        } => {
            let stack_override = stack_override.as_deref();
            match command {
                StageCommands::List => stage::list(stack_override),
                StageCommands::Select { stage_id } => stage::select(&stage_id, stack_override),
                StageCommands::Current => stage::current(stack_override),
                StageCommands::Open {
                    next,
                    stage: stage_id,
                    no_open,
                } => stage::open(
                    OpenTarget::from_flags(next, stage_id)?,
                    no_open,
                    stack_override,
                ),
                StageCommands::Push => stage::push(stack_override),
            }
        }
        Commands::Worktree { command } => match command {
            WorktreeCommands::Open {
                branch,
                base,
                path,
                no_open,
            } => worktree_cmd::open(&branch, base.as_deref(), path.as_deref(), no_open),
            WorktreeCommands::List => worktree_cmd::list(),
            WorktreeCommands::Prune => worktree_cmd::prune(),
        },
    }
}
