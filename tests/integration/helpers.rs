//! Shared test helpers for git-backed integration tests

use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

use mstack::errors::Result;
use mstack::models::{Stack, Stage};
use mstack::pr::{NewPullRequest, PullRequests};

/// Test helper: Run git in `dir`, panicking on failure, and return trimmed stdout
pub fn git(args: &[&str], dir: &Path) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Test helper: Create a temporary git repository with initial commit on `main`
pub fn init_test_repo() -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let repo_root = temp_dir.path();

    git(&["init"], repo_root);
    git(&["config", "user.email", "test@test.com"], repo_root);
    git(&["config", "user.name", "Test User"], repo_root);
    git(&["config", "commit.gpgsign", "false"], repo_root);

    fs::write(repo_root.join("README.md"), "# Test Repository\n")
        .expect("Failed to write README.md");
    git(&["add", "."], repo_root);
    git(&["commit", "-m", "Initial commit"], repo_root);
    git(&["branch", "-M", "main"], repo_root);

    temp_dir
}

/// Test helper: Write `filename` in `dir` and commit it
pub fn commit_file(dir: &Path, filename: &str, content: &str) {
    fs::write(dir.join(filename), content).expect("Failed to write file");
    git(&["add", filename], dir);
    git(&["commit", "-m", &format!("Update {filename}")], dir);
}

/// Test helper: Commit `ref` resolves to
pub fn rev(reference: &str, dir: &Path) -> String {
    git(&["rev-parse", reference], dir)
}

/// Test helper: Number of commits in `to` that are not in `from`
pub fn commits_between(from: &str, to: &str, dir: &Path) -> usize {
    git(&["rev-list", "--count", &format!("{from}..{to}")], dir)
        .parse()
        .expect("rev-list count is a number")
}

/// Test helper: Stack named `feat` with one stage per id
pub fn test_stack(ids: &[&str]) -> Stack {
    Stack::new(
        "feat",
        "/plans/feat.md",
        ids.iter()
            .map(|id| Stage::new(*id, format!("Stage {id}")))
            .collect(),
    )
}

/// Pull requests stub: nothing is open, `merged` branches report merged.
#[derive(Debug, Default)]
pub struct MergedPrs {
    pub merged: Vec<String>,
    pub queries: RefCell<Vec<String>>,
}

impl MergedPrs {
    pub fn with_merged(branches: &[&str]) -> Self {
        Self {
            merged: branches.iter().map(|b| b.to_string()).collect(),
            queries: RefCell::default(),
        }
    }
}

impl PullRequests for MergedPrs {
    fn find_open_pr_url(&self, _branch: &str) -> Result<Option<String>> {
        Ok(None)
    }

    fn is_merged(&self, branch: &str) -> Result<bool> {
        self.queries.borrow_mut().push(branch.to_string());
        Ok(self.merged.iter().any(|b| b == branch))
    }

    fn create(&self, _request: &NewPullRequest<'_>) -> Result<()> {
        unreachable!("sync never creates pull requests")
    }

    fn edit_body(&self, _url: &str, _body: &str) -> Result<()> {
        unreachable!("sync never edits pull requests")
    }
}
