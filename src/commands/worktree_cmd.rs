//! Worktree management commands
//! Usage: m worktree [open <branch>|list|prune]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::common::RepoContext;
use super::output;
use crate::agent::open_agent;
use crate::errors::StackError;
use crate::git::worktree::{
    is_within_dir, list_worktrees, normalize_path, prune_worktrees,
    remove_orphan_managed_worktrees,
};
use crate::git::Vcs;

/// Create-if-absent a branch and its worktree outside any stack.
pub fn open(branch: &str, base: Option<&str>, path: Option<&Path>, no_open: bool) -> Result<()> {
    let branch = branch.trim();
    if branch.is_empty() {
        return Err(StackError::InvalidBranchName.into());
    }

    let repo = RepoContext::discover()?;
    let store = repo.store();
    store.ensure_initialized()?;
    let vcs = repo.vcs();

    let from = base
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .unwrap_or(repo.default_branch.as_str());
    if vcs.branch_exists(branch) {
        output::reuse(format!("Reusing branch {branch}"));
    } else {
        vcs.create_branch(branch, from)?;
        output::success(format!("Created branch {branch} from {from}"));
    }

    let worktree = match path {
        Some(custom) => std::path::absolute(custom)
            .with_context(|| format!("Failed to resolve path: {}", custom.display()))?,
        None => store.dir().adhoc_worktree_path(branch),
    };
    if worktree.exists() {
        output::reuse(format!("Reusing worktree: {}", worktree.display()));
    } else {
        vcs.add_worktree(&worktree, branch)?;
        output::success(format!("Created worktree: {}", worktree.display()));
    }

    if no_open {
        return Ok(());
    }
    open_agent(&worktree, None)?;
    Ok(())
}

/// One `worktree list` line: current marker, path, kind, branch, owner.
fn list_line(
    path: &Path,
    is_current: bool,
    managed: bool,
    branch: &str,
    owner: Option<&str>,
) -> String {
    let marker = if is_current { "*" } else { " " };
    let kind = if managed { "managed" } else { "external" };
    let mut line = format!("{marker} {}  [{kind}]  {branch}", path.display());
    if let Some(owner) = owner {
        line.push_str(&format!("  ·  {owner}"));
    }
    line
}

pub fn list() -> Result<()> {
    let repo = RepoContext::discover()?;
    let worktrees = list_worktrees(&repo.root)?;
    let stacks = repo.store().load_stacks()?;

    let mut owners: HashMap<PathBuf, String> = HashMap::new();
    for stack in &stacks.stacks {
        for stage in &stack.stages {
            if let Some(path) = stage.recorded_worktree().and_then(normalize_path) {
                owners.insert(path, format!("{}/{}", stack.name, stage.id));
            }
        }
    }

    let managed_root = repo.state_dir().worktrees_dir();
    let current = normalize_path(&repo.worktree);
    for wt in &worktrees {
        let normalized = normalize_path(&wt.path);
        let line = list_line(
            &wt.path,
            normalized.is_some() && normalized == current,
            is_within_dir(&wt.path, &managed_root),
            wt.branch_label(),
            normalized
                .as_ref()
                .and_then(|p| owners.get(p))
                .map(String::as_str),
        );
        println!("{line}");
    }

    output::info(format!("Total worktrees: {}", worktrees.len()));
    Ok(())
}

pub fn prune() -> Result<()> {
    let repo = RepoContext::discover()?;
    prune_worktrees(&repo.root)?;

    let active: HashSet<PathBuf> = list_worktrees(&repo.root)?
        .iter()
        .filter_map(|wt| normalize_path(&wt.path))
        .collect();

    let store = repo.store();
    let removed_dirs = remove_orphan_managed_worktrees(&store.dir().worktrees_dir(), &active)?;

    let mut stacks = store.load_stacks()?;
    let cleared = stacks.clear_missing_stage_worktrees(|path| match normalize_path(path) {
        Some(normalized) => active.contains(&normalized) || normalized.exists(),
        None => false,
    });
    if cleared > 0 {
        store.save_stacks(&mut stacks)?;
    }

    output::success("Pruned git worktrees");
    output::info(format!("Removed orphan managed directories: {removed_dirs}"));
    output::info(format!("Cleared stale stage worktree references: {cleared}"));
    Ok(())
}
