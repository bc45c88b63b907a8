//! Starting stages against a real repository

use serial_test::serial;
use std::fs;

use mstack::engine::start_stage;
use mstack::errors::StackError;
use mstack::fs::StateDir;
use mstack::git::GitCli;

use super::helpers::*;

#[test]
#[serial]
fn test_stages_chain_off_each_other() {
    let temp_dir = init_test_repo();
    let repo_root = temp_dir.path();
    let state_dir = StateDir::new(repo_root);
    let vcs = GitCli::new(repo_root);
    let mut stack = test_stack(&["db", "api"]);

    let first = start_stage(&mut stack, 0, &vcs, &state_dir).expect("Failed to start db");
    assert_eq!(first.branch, "feat/1/db");
    assert_eq!(first.parent, "main");
    assert_eq!(first.worktree, state_dir.stage_worktree_path("feat", "db"));
    commit_file(&first.worktree, "schema.sql", "create table orders;");

    let second = start_stage(&mut stack, 1, &vcs, &state_dir).expect("Failed to start api");
    assert_eq!(second.parent, "feat/1/db");
    assert!(
        second.worktree.join("schema.sql").exists(),
        "api worktree should contain the db stage's commit"
    );
    assert_eq!(git(&["rev-parse", "--abbrev-ref", "HEAD"], &second.worktree), "feat/2/api");
    assert_eq!(stack.current_stage.as_deref(), Some("api"));
}

#[test]
#[serial]
fn test_restart_reuses_branch_and_worktree() {
    let temp_dir = init_test_repo();
    let repo_root = temp_dir.path();
    let state_dir = StateDir::new(repo_root);
    let vcs = GitCli::new(repo_root);
    let mut stack = test_stack(&["db"]);

    let first = start_stage(&mut stack, 0, &vcs, &state_dir).unwrap();
    commit_file(&first.worktree, "schema.sql", "v1");
    let head = rev("feat/1/db", repo_root);

    let again = start_stage(&mut stack, 0, &vcs, &state_dir).unwrap();

    assert!(!again.created_branch);
    assert!(!again.created_worktree);
    assert_eq!(rev("feat/1/db", repo_root), head);
}

#[test]
#[serial]
fn test_later_stage_needs_started_parent() {
    let temp_dir = init_test_repo();
    let repo_root = temp_dir.path();
    let state_dir = StateDir::new(repo_root);
    let mut stack = test_stack(&["db", "api"]);

    let err = start_stage(&mut stack, 1, &GitCli::new(repo_root), &state_dir).unwrap_err();

    assert!(matches!(err, StackError::PreviousStageNotStarted { .. }));
    assert!(!state_dir.stage_worktree_path("feat", "api").exists());
    assert!(stack.stages[1].branch.is_none());
}

#[test]
#[serial]
fn test_env_files_are_copied_into_new_worktree() {
    let temp_dir = init_test_repo();
    let repo_root = temp_dir.path();
    fs::write(repo_root.join(".env"), "TOKEN=abc\n").unwrap();
    let state_dir = StateDir::new(repo_root);
    let mut stack = test_stack(&["db"]);

    let checkout = start_stage(&mut stack, 0, &GitCli::new(repo_root), &state_dir).unwrap();

    assert_eq!(
        fs::read_to_string(checkout.worktree.join(".env")).unwrap(),
        "TOKEN=abc\n"
    );
}
