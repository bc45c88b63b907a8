//! Worktree operations
//!
//! Create, remove, list and prune git worktrees, plus cleanup of managed
//! directories git no longer knows about.

use std::collections::HashSet;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::parser::{parse_worktree_list, WorktreeInfo};
use super::paths::normalize_path;
use crate::errors::Result;
use crate::git::runner::run_git_checked;

/// Check out an existing `branch` into a new worktree at `path`.
///
/// Runs `git worktree add <path> <branch>` from `repo_root`, then copies the
/// root's `.env` files into the new worktree.
pub fn add_worktree(repo_root: &Path, path: &Path, branch: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let path_str = path.to_string_lossy();
    info!(path = %path.display(), branch, "adding worktree");
    run_git_checked(&["worktree", "add", &path_str, branch], repo_root)?;

    let copied = copy_root_env_files(repo_root, path)?;
    if copied > 0 {
        debug!(copied, worktree = %path.display(), "copied .env files");
    }
    Ok(())
}

/// Force-remove a worktree.
///
/// Runs: `git worktree remove --force <path>`
pub fn remove_worktree(repo_root: &Path, path: &Path) -> Result<()> {
    let path_str = path.to_string_lossy();
    info!(path = %path.display(), "removing worktree");
    run_git_checked(&["worktree", "remove", "--force", &path_str], repo_root)?;
    Ok(())
}

/// Drop git's administrative records for worktrees whose directories are gone.
pub fn prune_worktrees(repo_root: &Path) -> Result<()> {
    run_git_checked(&["worktree", "prune"], repo_root)?;
    Ok(())
}

/// List all worktrees sorted by path.
pub fn list_worktrees(repo_root: &Path) -> Result<Vec<WorktreeInfo>> {
    let output = run_git_checked(&["worktree", "list", "--porcelain"], repo_root)?;
    let mut worktrees = parse_worktree_list(&output);
    worktrees.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(worktrees)
}

fn is_env_file(name: &str) -> bool {
    name == ".env" || name.starts_with(".env.")
}

/// Copy `.env` and `.env.*` regular files from `root` into `worktree`.
///
/// Existing files in the worktree are never overwritten. Returns the number
/// of files copied.
pub fn copy_root_env_files(root: &Path, worktree: &Path) -> Result<usize> {
    let mut copied = 0;
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !is_env_file(name) {
            continue;
        }
        // file_type does not follow symlinks, so only real files qualify
        if !entry.file_type()?.is_file() {
            continue;
        }

        let dest = worktree.join(name);
        if copy_if_absent(&entry.path(), &dest)? {
            copied += 1;
        }
    }
    Ok(copied)
}

fn copy_if_absent(src: &Path, dest: &Path) -> Result<bool> {
    let mut target = match fs::OpenOptions::new().write(true).create_new(true).open(dest) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(e.into()),
    };
    let mut source = fs::File::open(src)?;
    io::copy(&mut source, &mut target)?;
    target.set_permissions(fs::metadata(src)?.permissions())?;
    Ok(true)
}

/// Directories under `root` that look like worktree checkouts (contain `.git`).
///
/// The search does not descend into a checkout once found.
fn collect_managed_worktree_roots(root: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        if dir != root && dir.join(".git").is_file() {
            found.push(dir);
            continue;
        }
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                pending.push(entry.path());
            }
        }
    }
    found.sort();
    Ok(found)
}

/// Delete checkouts under `managed_root` that are not in `active`, then
/// remove any directories left empty.
///
/// `active` holds normalised paths of every worktree git still lists.
/// Returns the number of checkouts removed.
pub fn remove_orphan_managed_worktrees(
    managed_root: &Path,
    active: &HashSet<PathBuf>,
) -> Result<usize> {
    if !managed_root.exists() {
        return Ok(0);
    }

    let mut removed = 0;
    for checkout in collect_managed_worktree_roots(managed_root)? {
        let Some(normalized) = normalize_path(&checkout) else {
            continue;
        };
        if active.contains(&normalized) {
            continue;
        }
        info!(path = %normalized.display(), "removing orphan worktree directory");
        fs::remove_dir_all(&normalized)?;
        removed += 1;
    }

    remove_empty_subdirs(managed_root)?;
    Ok(removed)
}

/// Remove empty directories beneath `root`, deepest first. `root` itself stays.
fn remove_empty_subdirs(root: &Path) -> Result<()> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let child = entry.path();
        remove_empty_subdirs(&child)?;
        if fs::read_dir(&child)?.next().is_none() {
            fs::remove_dir(&child)?;
        }
    }
    Ok(())
}
