//! Core branch operations: create, delete, check existence, push

use std::path::Path;

use tracing::info;

use super::naming::REMOTE;
use crate::errors::Result;
use crate::git::runner::{run_git_bool, run_git_checked};

/// Create `name` pointing at `from`.
pub fn create_branch(name: &str, from: &str, repo_root: &Path) -> Result<()> {
    info!(branch = name, from, "creating branch");
    run_git_checked(&["branch", name, from], repo_root)?;
    Ok(())
}

/// Force-delete a local branch.
pub fn delete_branch(name: &str, repo_root: &Path) -> Result<()> {
    info!(branch = name, "deleting branch");
    run_git_checked(&["branch", "-D", name], repo_root)?;
    Ok(())
}

/// Get the current branch name
pub fn current_branch(dir: &Path) -> Result<String> {
    run_git_checked(&["rev-parse", "--abbrev-ref", "HEAD"], dir)
}

/// Check if a local branch exists
pub fn branch_exists(name: &str, repo_root: &Path) -> bool {
    let ref_path = format!("refs/heads/{name}");
    run_git_bool(&["show-ref", "--verify", "--quiet", &ref_path], repo_root)
}

/// Check if `branch` exists on `remote`.
///
/// Blank names are never present. Any failure to reach the remote counts as
/// absent.
pub fn remote_branch_exists(remote: &str, branch: &str, repo_root: &Path) -> bool {
    let (remote, branch) = (remote.trim(), branch.trim());
    if remote.is_empty() || branch.is_empty() {
        return false;
    }
    let ref_path = format!("refs/heads/{branch}");
    run_git_bool(
        &["ls-remote", "--exit-code", "--heads", remote, &ref_path],
        repo_root,
    )
}

/// Push `branch` to the remote and set its upstream.
pub fn push_branch(branch: &str, force_with_lease: bool, repo_root: &Path) -> Result<()> {
    let mut args = vec!["push", "-u", REMOTE, branch];
    if force_with_lease {
        args.push("--force-with-lease");
    }
    info!(branch, force_with_lease, "pushing branch");
    run_git_checked(&args, repo_root)?;
    Ok(())
}

/// Get the default branch of the repository.
///
/// Resolution order, first successful probe wins:
/// 1. the remote's recorded HEAD (`origin/HEAD`)
/// 2. a local `main`
/// 3. a local `master`
/// 4. the currently checked-out branch
pub fn default_branch(dir: &Path) -> Result<String> {
    if let Ok(sym_ref) = run_git_checked(
        &["symbolic-ref", "--short", "refs/remotes/origin/HEAD"],
        dir,
    ) {
        let branch = sym_ref.strip_prefix("origin/").unwrap_or(&sym_ref);
        return Ok(branch.to_string());
    }

    for candidate in ["main", "master"] {
        if branch_exists(candidate, dir) {
            return Ok(candidate.to_string());
        }
    }

    current_branch(dir)
}
