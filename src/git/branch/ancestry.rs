//! Commit ancestry queries used to pick a transplant boundary

use std::path::Path;

use crate::errors::{Result, StackError};
use crate::git::runner::run_git;
use crate::process::command_line;

/// True if `rev` resolves to a commit. Failing to run git is an error.
pub fn commit_exists(rev: &str, repo_root: &Path) -> Result<bool> {
    let spec = format!("{rev}^{{commit}}");
    let output = run_git(&["rev-parse", "--verify", "--quiet", &spec], repo_root)?;
    Ok(output.status.success())
}

/// Check if `ancestor` is reachable from `descendant`.
///
/// Uses `git merge-base --is-ancestor`: exit 0 is `true`, exit 1 is `false`,
/// anything else (unknown refs, a broken repository) is an error.
pub fn is_ancestor(ancestor: &str, descendant: &str, repo_root: &Path) -> Result<bool> {
    let args = ["merge-base", "--is-ancestor", ancestor, descendant];
    let output = run_git(&args, repo_root)?;
    match output.status.code() {
        Some(0) => Ok(true),
        Some(1) => Ok(false),
        _ => {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            Err(StackError::CommandFailed {
                command: command_line("git", &args),
                message: if stderr.is_empty() {
                    output.status.to_string()
                } else {
                    stderr
                },
            })
        }
    }
}

/// Best common ancestor of two refs.
///
/// Returns `Ok(None)` when git reports no common ancestor or either ref is
/// unknown; only a failure to run git at all is an error.
pub fn merge_base(a: &str, b: &str, repo_root: &Path) -> Result<Option<String>> {
    let output = run_git(&["merge-base", a, b], repo_root)?;
    if !output.status.success() {
        return Ok(None);
    }
    let sha = String::from_utf8_lossy(&output.stdout).trim().to_string();
    Ok((!sha.is_empty()).then_some(sha))
}
