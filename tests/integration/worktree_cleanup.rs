//! Worktree listing and cleanup of stale or orphaned checkouts

use serial_test::serial;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use mstack::engine::start_stage;
use mstack::fs::StateDir;
use mstack::git::worktree::{
    list_worktrees, normalize_path, prune_worktrees, remove_orphan_managed_worktrees,
};
use mstack::git::{GitCli, Vcs};
use mstack::models::Stacks;

use super::helpers::*;

fn active_worktrees(repo_root: &std::path::Path) -> HashSet<PathBuf> {
    list_worktrees(repo_root)
        .unwrap()
        .iter()
        .filter_map(|wt| normalize_path(&wt.path))
        .collect()
}

#[test]
#[serial]
fn test_list_worktrees_reports_branches() {
    let temp_dir = init_test_repo();
    let repo_root = temp_dir.path();
    let state_dir = StateDir::new(repo_root);
    let mut stack = test_stack(&["db"]);
    let checkout = start_stage(&mut stack, 0, &GitCli::new(repo_root), &state_dir).unwrap();

    let worktrees = list_worktrees(repo_root).unwrap();

    assert_eq!(worktrees.len(), 2);
    let stage_wt = worktrees
        .iter()
        .find(|wt| normalize_path(&wt.path) == normalize_path(&checkout.worktree))
        .expect("stage worktree listed");
    assert_eq!(stage_wt.branch_label(), "feat/1/db");
    assert!(worktrees.iter().any(|wt| wt.branch_label() == "main"));
}

#[test]
#[serial]
fn test_prune_forgets_deleted_worktree_and_clears_stage_record() {
    let temp_dir = init_test_repo();
    let repo_root = temp_dir.path();
    let state_dir = StateDir::new(repo_root);
    let mut stack = test_stack(&["db"]);
    let checkout = start_stage(&mut stack, 0, &GitCli::new(repo_root), &state_dir).unwrap();
    let mut stacks = Stacks {
        stacks: vec![stack],
        ..Stacks::default()
    };

    fs::remove_dir_all(&checkout.worktree).unwrap();
    prune_worktrees(repo_root).unwrap();
    let active = active_worktrees(repo_root);

    assert_eq!(active.len(), 1);
    let cleared = stacks.clear_missing_stage_worktrees(|path| {
        normalize_path(path).is_some_and(|p| active.contains(&p) || p.exists())
    });
    assert_eq!(cleared, 1);
    assert!(stacks.stacks[0].stages[0].worktree.is_none());
    assert_eq!(
        stacks.stacks[0].stages[0].branch.as_deref(),
        Some("feat/1/db")
    );
}

#[test]
#[serial]
fn test_orphan_managed_directories_are_removed() {
    let temp_dir = init_test_repo();
    let repo_root = temp_dir.path();
    let state_dir = StateDir::new(repo_root);
    let vcs = GitCli::new(repo_root);
    let worktrees_dir = state_dir.worktrees_dir();

    git(&["branch", "fix/login", "main"], repo_root);
    let live = state_dir.adhoc_worktree_path("fix/login");
    vcs.add_worktree(&live, "fix/login").unwrap();

    // a checkout git no longer tracks
    let orphan = worktrees_dir.join("spike").join("old");
    fs::create_dir_all(&orphan).unwrap();
    fs::write(orphan.join(".git"), "gitdir: /nowhere\n").unwrap();
    fs::write(orphan.join("notes.txt"), "stale").unwrap();

    let removed =
        remove_orphan_managed_worktrees(&worktrees_dir, &active_worktrees(repo_root)).unwrap();

    assert_eq!(removed, 1);
    assert!(!worktrees_dir.join("spike").exists());
    assert!(live.join("README.md").exists());
}
