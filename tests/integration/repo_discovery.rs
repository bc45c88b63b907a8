//! Repository discovery from the primary checkout and from linked worktrees

use serial_test::serial;

use mstack::fs::local_exclude::ensure_pattern;
use mstack::fs::{StateDir, StateStore};
use mstack::git::branch::default_branch;
use mstack::git::discover_repo;
use mstack::git::worktree::normalize_path;

use super::helpers::*;

#[test]
#[serial]
fn test_discover_primary_checkout() {
    let temp_dir = init_test_repo();
    let repo_root = temp_dir.path();

    let info = discover_repo(repo_root).expect("Failed to discover repo");

    assert_eq!(normalize_path(&info.shared_root()), normalize_path(repo_root));
    assert_eq!(info.default_branch, "main");
    assert!(!info.is_linked_worktree());
}

#[test]
#[serial]
fn test_linked_worktree_shares_state_root() {
    let temp_dir = init_test_repo();
    let repo_root = temp_dir.path();
    let linked = repo_root.join(".m").join("worktrees").join("spike");
    git(&["branch", "spike", "main"], repo_root);
    git(
        &["worktree", "add", linked.to_str().unwrap(), "spike"],
        repo_root,
    );

    let info = discover_repo(&linked).expect("Failed to discover repo");

    assert_eq!(normalize_path(&info.shared_root()), normalize_path(repo_root));
    assert_eq!(normalize_path(&info.top_level), normalize_path(&linked));
    assert!(info.is_linked_worktree());
    assert_eq!(info.default_branch, "main");
}

#[test]
#[serial]
fn test_init_state_and_exclude_are_idempotent() {
    let temp_dir = init_test_repo();
    let repo_root = temp_dir.path();
    let info = discover_repo(repo_root).expect("Failed to discover repo");
    let store = StateStore::new(StateDir::new(info.shared_root()));

    store.ensure_initialized().unwrap();
    assert!(ensure_pattern(&info.common_dir, ".m/").unwrap());
    store.ensure_initialized().unwrap();
    assert!(!ensure_pattern(&info.common_dir, ".m/").unwrap());

    assert!(store.dir().config_path().exists());
    assert!(store.dir().stacks_path().exists());
    // .m/ is excluded, so the tree is still clean
    assert_eq!(git(&["status", "--porcelain"], repo_root), "");
}

#[test]
#[serial]
fn test_default_branch_prefers_origin_head() {
    let source = init_test_repo();
    git(&["branch", "-m", "main", "develop"], source.path());
    let remotes = tempfile::TempDir::new().unwrap();
    let bare = remotes.path().join("origin.git");
    let clone = remotes.path().join("clone");
    git(
        &["clone", "--bare", source.path().to_str().unwrap(), bare.to_str().unwrap()],
        remotes.path(),
    );
    git(
        &["clone", bare.to_str().unwrap(), clone.to_str().unwrap()],
        remotes.path(),
    );
    // local main and a different checkout must not win over origin/HEAD
    git(&["branch", "main"], &clone);
    git(&["checkout", "-b", "topic"], &clone);

    assert_eq!(default_branch(&clone).unwrap(), "develop");
}

#[test]
#[serial]
fn test_default_branch_falls_back_to_master() {
    let temp_dir = init_test_repo();
    let repo_root = temp_dir.path();
    git(&["branch", "-m", "main", "master"], repo_root);
    git(&["checkout", "-b", "topic"], repo_root);

    assert_eq!(default_branch(repo_root).unwrap(), "master");
}

#[test]
#[serial]
fn test_default_branch_falls_back_to_checked_out_branch() {
    let temp_dir = init_test_repo();
    let repo_root = temp_dir.path();
    git(&["branch", "-m", "main", "trunk"], repo_root);

    assert_eq!(default_branch(repo_root).unwrap(), "trunk");
    assert_eq!(discover_repo(repo_root).unwrap().default_branch, "trunk");
}
