//! Stack sync against a real repository: plain rebases, transplants after
//! squash merges, and conflict recovery

use serial_test::serial;
use std::path::Path;

use mstack::engine::{start_stage, sync_stack, RebaseMode};
use mstack::errors::StackError;
use mstack::fs::StateDir;
use mstack::git::GitCli;
use mstack::models::Stack;

use super::helpers::*;

/// Start every stage of `stack`, committing `<id>.txt` in each worktree.
fn start_all(stack: &mut Stack, repo_root: &Path, state_dir: &StateDir) {
    let vcs = GitCli::new(repo_root);
    for index in 0..stack.stages.len() {
        let checkout = start_stage(stack, index, &vcs, state_dir).expect("Failed to start stage");
        commit_file(
            &checkout.worktree,
            &format!("{}.txt", checkout.stage_id),
            &checkout.stage_id,
        );
    }
}

#[test]
#[serial]
fn test_sync_rebases_chain_onto_advanced_default_branch() {
    let temp_dir = init_test_repo();
    let repo_root = temp_dir.path();
    let state_dir = StateDir::new(repo_root);
    let mut stack = test_stack(&["a", "b"]);
    start_all(&mut stack, repo_root, &state_dir);

    commit_file(repo_root, "hotfix.txt", "fix");
    let prs = MergedPrs::default();

    let report = sync_stack(
        &mut stack,
        "main",
        false,
        &GitCli::new(repo_root),
        &prs,
        &state_dir,
    )
    .expect("sync failed");

    assert!(prs.queries.borrow().is_empty(), "no merge probes without prune");
    assert_eq!(report.rebased.len(), 2);
    assert!(report.rebased.iter().all(|r| r.mode == RebaseMode::Plain));
    assert!(report.pruned.is_empty());
    assert!(report.mutated);

    git(&["merge-base", "--is-ancestor", "main", "feat/1/a"], repo_root);
    git(&["merge-base", "--is-ancestor", "feat/1/a", "feat/2/b"], repo_root);
    assert_eq!(commits_between("main", "feat/2/b", repo_root), 2);
}

#[test]
#[serial]
fn test_sync_transplants_after_squash_merge() {
    let temp_dir = init_test_repo();
    let repo_root = temp_dir.path();
    let state_dir = StateDir::new(repo_root);
    let mut stack = test_stack(&["a", "b"]);
    start_all(&mut stack, repo_root, &state_dir);
    let a_worktree = state_dir.stage_worktree_path("feat", "a");

    git(&["merge", "--squash", "feat/1/a"], repo_root);
    git(&["commit", "-m", "Squashed a"], repo_root);
    let prs = MergedPrs::with_merged(&["feat/1/a"]);

    let report = sync_stack(
        &mut stack,
        "main",
        true,
        &GitCli::new(repo_root),
        &prs,
        &state_dir,
    )
    .expect("sync failed");

    assert_eq!(report.pruned, vec!["a".to_string()]);
    assert_eq!(report.rebased.len(), 1);
    assert_eq!(report.rebased[0].mode, RebaseMode::Transplant);
    assert_eq!(report.rebased[0].onto, "main");

    let ids: Vec<&str> = stack.stages.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["b"]);
    assert_eq!(stack.stages[0].parent.as_deref(), Some("main"));
    // only b's own commit is replayed on top of the squash
    assert_eq!(commits_between("main", "feat/2/b", repo_root), 1);

    assert_eq!(git(&["branch", "--list", "feat/1/a"], repo_root), "");
    assert!(!a_worktree.exists());
}

#[test]
#[serial]
fn test_sync_conflict_aborts_and_leaves_branch_untouched() {
    let temp_dir = init_test_repo();
    let repo_root = temp_dir.path();
    let state_dir = StateDir::new(repo_root);
    let mut stack = test_stack(&["a"]);
    let checkout = start_stage(&mut stack, 0, &GitCli::new(repo_root), &state_dir).unwrap();
    commit_file(&checkout.worktree, "README.md", "# Stage a\n");
    commit_file(repo_root, "README.md", "# Main moved on\n");
    let head = rev("feat/1/a", repo_root);
    let before = stack.clone();

    let err = sync_stack(
        &mut stack,
        "main",
        false,
        &GitCli::new(repo_root),
        &MergedPrs::default(),
        &state_dir,
    )
    .unwrap_err();

    match err {
        StackError::RebaseAborted { stage, mode, .. } => {
            assert_eq!(stage, "a");
            assert_eq!(mode, RebaseMode::Plain);
        }
        other => panic!("expected RebaseAborted, got {other:?}"),
    }
    assert_eq!(rev("feat/1/a", repo_root), head);
    assert!(!git(&["status"], &checkout.worktree).contains("rebase in progress"));
    assert_eq!(stack, before);
}

#[test]
#[serial]
fn test_transplant_uses_merge_base_when_merged_branch_was_amended() {
    let temp_dir = init_test_repo();
    let repo_root = temp_dir.path();
    let fork_point = rev("main", repo_root);
    let state_dir = StateDir::new(repo_root);
    let mut stack = test_stack(&["a", "b"]);
    start_all(&mut stack, repo_root, &state_dir);

    // a is rewritten after b branched off it, so feat/1/a is no longer an
    // ancestor of feat/2/b
    let a_worktree = state_dir.stage_worktree_path("feat", "a");
    git(&["commit", "--amend", "-m", "Reworded a"], &a_worktree);
    assert!(commits_between("feat/2/b", "feat/1/a", repo_root) > 0);

    git(&["merge", "--squash", "feat/1/a"], repo_root);
    git(&["commit", "-m", "Squashed a"], repo_root);

    let report = sync_stack(
        &mut stack,
        "main",
        true,
        &GitCli::new(repo_root),
        &MergedPrs::with_merged(&["feat/1/a"]),
        &state_dir,
    )
    .expect("sync failed");

    assert_eq!(report.rebased.len(), 1);
    assert_eq!(report.rebased[0].mode, RebaseMode::Transplant);
    assert_eq!(report.rebased[0].upstream.as_deref(), Some(fork_point.as_str()));
    assert!(report.warnings.is_empty());
    assert_eq!(commits_between("main", "feat/2/b", repo_root), 1);
    assert_eq!(git(&["show", "feat/2/b:b.txt"], repo_root), "b");
}

#[test]
#[serial]
fn test_unstarted_stage_takes_shifted_name_after_prune() {
    let temp_dir = init_test_repo();
    let repo_root = temp_dir.path();
    let state_dir = StateDir::new(repo_root);
    let vcs = GitCli::new(repo_root);
    let mut stack = test_stack(&["a", "b", "c"]);
    for index in 0..2 {
        let checkout = start_stage(&mut stack, index, &vcs, &state_dir).unwrap();
        commit_file(&checkout.worktree, &format!("{}.txt", checkout.stage_id), "x");
    }

    git(&["merge", "--squash", "feat/1/a"], repo_root);
    git(&["commit", "-m", "Squashed a"], repo_root);
    sync_stack(
        &mut stack,
        "main",
        true,
        &vcs,
        &MergedPrs::with_merged(&["feat/1/a"]),
        &state_dir,
    )
    .expect("sync failed");

    // b keeps the branch it was started on; c is derived from its new index
    assert_eq!(stack.stage_branch(0), "feat/2/b");
    assert_eq!(stack.stage_branch(1), "feat/2/c");

    let checkout = start_stage(&mut stack, 1, &vcs, &state_dir).unwrap();
    assert_eq!(checkout.branch, "feat/2/c");
    assert_eq!(checkout.parent, "feat/2/b");
    assert_eq!(rev("feat/2/c", repo_root), rev("feat/2/b", repo_root));
    assert_eq!(git(&["branch", "--list", "feat/3/c"], repo_root), "");
}
