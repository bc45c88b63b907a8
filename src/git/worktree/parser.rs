//! Worktree output parsing
//!
//! Parses `git worktree list --porcelain` output into structured data.

use std::path::PathBuf;

/// Parsed worktree information from `git worktree list`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorktreeInfo {
    pub path: PathBuf,
    pub branch: Option<String>,
    pub detached: bool,
}

impl WorktreeInfo {
    /// Branch for display, `(detached)` when there is none.
    pub fn branch_label(&self) -> &str {
        match self.branch.as_deref() {
            Some(branch) if !self.detached && !branch.trim().is_empty() => branch,
            _ => "(detached)",
        }
    }
}

/// Parse `git worktree list --porcelain` output
///
/// Example input:
/// ```text
/// worktree /home/user/repo
/// HEAD abc123def456
/// branch refs/heads/main
///
/// worktree /home/user/repo/.m/stacks/feat/db
/// HEAD def789abc012
/// detached
/// ```
///
/// Records without a path are dropped.
pub fn parse_worktree_list(output: &str) -> Vec<WorktreeInfo> {
    let mut worktrees = Vec::new();
    let mut current: Option<WorktreeInfo> = None;

    for line in output.lines().map(str::trim) {
        if line.is_empty() {
            worktrees.extend(current.take());
            continue;
        }

        if let Some(path) = line.strip_prefix("worktree ") {
            worktrees.extend(current.take());
            let path = path.trim();
            if !path.is_empty() {
                current = Some(WorktreeInfo {
                    path: PathBuf::from(path),
                    branch: None,
                    detached: false,
                });
            }
        } else if let Some(branch_ref) = line.strip_prefix("branch ") {
            if let Some(ref mut wt) = current {
                let branch_ref = branch_ref.trim();
                let name = branch_ref.strip_prefix("refs/heads/").unwrap_or(branch_ref);
                wt.branch = Some(name.to_string());
            }
        } else if line == "detached" {
            if let Some(ref mut wt) = current {
                wt.detached = true;
            }
        }
    }

    worktrees.extend(current);
    worktrees
}
