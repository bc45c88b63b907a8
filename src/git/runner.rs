//! Git command runner abstraction
//!
//! Thin wrappers over [`crate::process`] with the program fixed to `git`.

use std::path::Path;
use std::process::Output;

use crate::errors::Result;
use crate::process::{run_checked, run_output, run_succeeds};

/// Run a git command and return the raw Output.
///
/// Use this when the exit status itself carries the answer and stderr is
/// not an error (e.g. `merge-base` with no common ancestor).
///
/// # Arguments
/// * `args` - Git command arguments (e.g., `&["branch", "-D", name]`)
/// * `dir` - Working directory for the git command
pub fn run_git(args: &[&str], dir: &Path) -> Result<Output> {
    run_output("git", args, dir)
}

/// Run a git command, check for success, and return stdout as a trimmed String.
///
/// # Arguments
/// * `args` - Git command arguments
/// * `dir` - Working directory for the git command
pub fn run_git_checked(args: &[&str], dir: &Path) -> Result<String> {
    run_checked("git", args, dir)
}

/// Run a git command and return true if exit code is 0.
///
/// Silently swallows errors (both spawn failures and non-zero exits).
/// Use this for status checks like `show-ref --verify --quiet`.
pub fn run_git_bool(args: &[&str], dir: &Path) -> bool {
    run_succeeds("git", args, dir)
}
