//! Subprocess utilities shared by the git and pull-request drivers
//!
//! Every external tool invocation captures stdout and stderr separately and
//! reports failures as [`StackError::CommandFailed`] prefixed with the literal
//! command line, so the caller can see exactly what was run.

use std::path::Path;
use std::process::{Command, Output};

use tracing::debug;

use crate::errors::{Result, StackError};

/// Render `program` and `args` as a single command line for error messages.
pub fn command_line(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        return program.to_string();
    }
    format!("{program} {}", args.join(" "))
}

/// Run `program` in `dir` and return the raw Output.
///
/// Spawn failures are mapped to `CommandFailed` carrying the process error.
pub fn run_output(program: &str, args: &[&str], dir: &Path) -> Result<Output> {
    debug!(command = %command_line(program, args), dir = %dir.display(), "running");
    Command::new(program)
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|e| StackError::CommandFailed {
            command: command_line(program, args),
            message: e.to_string(),
        })
}

/// Run `program` in `dir`, check for success, and return trimmed stdout.
///
/// On a non-zero exit the error message is the trimmed stderr, or the exit
/// status when stderr is empty.
pub fn run_checked(program: &str, args: &[&str], dir: &Path) -> Result<String> {
    let output = run_output(program, args, dir)?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let message = if stderr.is_empty() {
            output.status.to_string()
        } else {
            stderr
        };
        return Err(StackError::CommandFailed {
            command: command_line(program, args),
            message,
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Run `program` and return true if it exited with code 0.
///
/// Spawn failures count as false.
pub fn run_succeeds(program: &str, args: &[&str], dir: &Path) -> bool {
    run_output(program, args, dir)
        .map(|output| output.status.success())
        .unwrap_or(false)
}
