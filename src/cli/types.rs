use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mstack::validation::clap_stack_name_validator;

pub use super::types_stage::StageCommands;

#[derive(Parser)]
#[command(name = "m")]
#[command(about = "Stacked-branch workflow CLI", long_about = None)]
#[command(version)]
#[command(subcommand_help_heading = "Commands")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize local orchestration state for this repo
    Init,

    /// Show current repo and m workflow status
    Status,

    /// Manage stacks
    Stack {
        #[command(subcommand)]
        command: StackCommands,
    },

    /// Manage stages of the current stack
    Stage {
        /// Use this stack instead of inferring from workspace
        #[arg(long, global = true, value_parser = clap_stack_name_validator)]
        stack: Option<String>,

        #[command(subcommand)]
        command: StageCommands,
    },

    /// Manage git worktrees outside of stacks
    Worktree {
        #[command(subcommand)]
        command: WorktreeCommands,
    },
}

#[derive(Subcommand)]
pub enum StackCommands {
    /// Create a stack, optionally from a plan file
    New {
        /// Stack name (used as the branch namespace)
        #[arg(value_parser = clap_stack_name_validator)]
        name: String,

        /// Markdown plan file path
        #[arg(long)]
        plan_file: Option<PathBuf>,

        /// Free-form stack type label
        #[arg(long = "type")]
        stack_type: Option<String>,
    },

    /// Attach a plan to the selected stack
    AttachPlan {
        /// Markdown plan file path
        plan_file: PathBuf,
    },

    /// Remove a stack from local m state
    Remove {
        name: String,

        /// Allow removing a stack with started stages
        #[arg(long)]
        force: bool,

        /// Also remove .m/stacks/<name>
        #[arg(long)]
        delete_worktrees: bool,
    },

    /// Prune merged stages, remove their local resources, and rebase the rest
    Sync {
        /// Keep merged stages in state and only rebase started branches
        #[arg(long)]
        no_prune: bool,

        /// Use this stack instead of inferring from workspace
        #[arg(long)]
        stack: Option<String>,
    },

    /// Force-push every started stage and update all PRs
    Push {
        /// Use this stack instead of inferring from workspace
        #[arg(long)]
        stack: Option<String>,
    },

    /// List stacks
    List,

    /// Select the current stack
    Select { name: String },

    /// Print the current stack
    Current,
}

#[derive(Subcommand)]
pub enum WorktreeCommands {
    /// Create or open a branch worktree without plan/stage
    Open {
        branch: String,

        /// Base branch when creating a new branch (defaults to repo default branch)
        #[arg(long)]
        base: Option<String>,

        /// Custom worktree path (defaults to .m/worktrees/<branch>)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Skip launching the agent
        #[arg(long)]
        no_open: bool,
    },

    /// List git worktrees with m metadata
    List,

    /// Prune stale git worktrees and remove orphan managed directories
    Prune,
}
