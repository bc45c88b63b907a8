//! Stage-related CLI command types

use clap::Subcommand;
use mstack::validation::clap_stage_id_validator;

#[derive(Subcommand)]
pub enum StageCommands {
    /// List stages for the current stack
    List,

    /// Select the current stage
    Select {
        /// Stage ID (kebab-case letters and numbers)
        #[arg(value_parser = clap_stage_id_validator)]
        stage_id: String,
    },

    /// Print the current stage
    Current,

    /// Start a stage (branch + worktree) and open the agent in it
    Open {
        /// Start and open the next stage in the current stack
        #[arg(long, conflicts_with = "stage")]
        next: bool,

        /// Start and open the specified stage id in the current stack
        #[arg(long, value_parser = clap_stage_id_validator)]
        stage: Option<String>,

        /// Skip launching the agent
        #[arg(long)]
        no_open: bool,
    },

    /// Push the current stage (and unpublished earlier stages) and create PRs
    Push,
}
