//! Hand-off to the interactive coding agent
//!
//! The agent binary is `opencode` unless `M_AGENT` names another one. It runs
//! in the stage worktree with the terminal attached and returns when the user
//! exits it.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::info;

use crate::errors::{Result, StackError};
use crate::process::command_line;

pub const DEFAULT_AGENT: &str = "opencode";
pub const AGENT_ENV: &str = "M_AGENT";

/// Agent binary name: `M_AGENT` when set and non-blank, else the default.
pub fn agent_program() -> String {
    std::env::var(AGENT_ENV)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_AGENT.to_string())
}

fn resolve_agent(program: &str) -> Result<PathBuf> {
    which::which(program).map_err(|_| StackError::ToolMissing {
        tool: program.to_string(),
        hint: format!("install it or set {AGENT_ENV}"),
    })
}

/// Arguments passed to the agent for an optional prompt.
pub fn agent_args(prompt: Option<&str>) -> Vec<String> {
    match prompt.map(str::trim).filter(|p| !p.is_empty()) {
        Some(prompt) => vec!["--prompt".to_string(), prompt.to_string()],
        None => Vec::new(),
    }
}

/// Run the agent in `worktree`, inheriting stdio, and wait for it to exit.
pub fn open_agent(worktree: &Path, prompt: Option<&str>) -> Result<()> {
    let program = agent_program();
    let binary = resolve_agent(&program)?;
    let args = agent_args(prompt);

    info!(agent = %binary.display(), worktree = %worktree.display(), "opening agent");
    let status = Command::new(&binary)
        .args(&args)
        .current_dir(worktree)
        .status()?;

    if !status.success() {
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        return Err(StackError::CommandFailed {
            command: command_line(&program, &arg_refs),
            message: status.to_string(),
        });
    }
    Ok(())
}
