//! In-memory stand-ins for git and the PR tool.
//!
//! Every call is appended to a log so tests can assert on ordering.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use crate::errors::{Result, StackError};
use crate::git::Vcs;
use crate::pr::{NewPullRequest, PullRequests};

fn failed(command: &str) -> StackError {
    StackError::CommandFailed {
        command: command.to_string(),
        message: "CONFLICT (content): Merge conflict in src/lib.rs".to_string(),
    }
}

#[derive(Debug, Default)]
pub struct FakeVcs {
    pub default: String,
    pub branches: RefCell<BTreeSet<String>>,
    pub remote: RefCell<BTreeSet<String>>,
    /// Refs that resolve to a commit, beyond local branches.
    pub commits: BTreeSet<String>,
    /// `(ancestor, descendant)` pairs.
    pub ancestors: BTreeSet<(String, String)>,
    pub merge_bases: BTreeMap<(String, String), String>,
    pub fail_rebase: bool,
    pub fail_abort: bool,
    /// Make ancestry queries fail as if git could not be run.
    pub fail_ancestry: bool,
    pub calls: RefCell<Vec<String>>,
}

impl FakeVcs {
    pub fn new(default: &str) -> Self {
        Self {
            default: default.to_string(),
            ..Self::default()
        }
    }

    pub fn with_branches(self, branches: &[&str]) -> Self {
        self.branches
            .borrow_mut()
            .extend(branches.iter().map(|b| b.to_string()));
        self
    }

    fn log(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn calls_starting_with(&self, prefix: &str) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .cloned()
            .collect()
    }
}

impl Vcs for FakeVcs {
    fn default_branch(&self) -> Result<String> {
        Ok(self.default.clone())
    }

    fn branch_exists(&self, branch: &str) -> bool {
        self.branches.borrow().contains(branch)
    }

    fn remote_branch_exists(&self, branch: &str) -> bool {
        self.remote.borrow().contains(branch)
    }

    fn create_branch(&self, branch: &str, from: &str) -> Result<()> {
        self.log(format!("branch {branch} {from}"));
        self.branches.borrow_mut().insert(branch.to_string());
        Ok(())
    }

    fn delete_branch(&self, branch: &str) -> Result<()> {
        self.log(format!("branch -D {branch}"));
        self.branches.borrow_mut().remove(branch);
        Ok(())
    }

    fn add_worktree(&self, path: &Path, branch: &str) -> Result<()> {
        self.log(format!("worktree add {} {branch}", path.display()));
        fs::create_dir_all(path)?;
        Ok(())
    }

    fn remove_worktree(&self, path: &Path) -> Result<()> {
        self.log(format!("worktree remove {}", path.display()));
        fs::remove_dir_all(path)?;
        Ok(())
    }

    fn run_in(&self, _dir: &Path, args: &[&str]) -> Result<String> {
        let command = format!("git {}", args.join(" "));
        self.log(args.join(" "));
        match args {
            ["rebase", "--abort"] if self.fail_abort => Err(failed(&command)),
            ["rebase", "--abort"] => Ok(String::new()),
            ["rebase", ..] if self.fail_rebase => Err(failed(&command)),
            _ => Ok(String::new()),
        }
    }

    fn commit_exists(&self, rev: &str) -> Result<bool> {
        if self.fail_ancestry {
            return Err(failed(&format!("git rev-parse --verify --quiet {rev}^{{commit}}")));
        }
        Ok(self.commits.contains(rev) || self.branches.borrow().contains(rev))
    }

    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool> {
        Ok(self
            .ancestors
            .contains(&(ancestor.to_string(), descendant.to_string())))
    }

    fn merge_base(&self, a: &str, b: &str) -> Result<Option<String>> {
        Ok(self
            .merge_bases
            .get(&(a.to_string(), b.to_string()))
            .cloned())
    }

    fn push(&self, branch: &str, force_with_lease: bool) -> Result<()> {
        if force_with_lease {
            self.log(format!("push -u origin {branch} --force-with-lease"));
        } else {
            self.log(format!("push -u origin {branch}"));
        }
        self.remote.borrow_mut().insert(branch.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPr {
    pub head: String,
    pub base: String,
    pub title: String,
    pub body: String,
}

#[derive(Debug)]
pub struct FakePrs {
    pub open: RefCell<BTreeMap<String, String>>,
    pub merged: BTreeSet<String>,
    pub merged_queries: RefCell<Vec<String>>,
    pub created: RefCell<Vec<CreatedPr>>,
    pub edited: RefCell<Vec<(String, String)>>,
    next_number: Cell<u32>,
}

impl Default for FakePrs {
    fn default() -> Self {
        Self {
            open: RefCell::default(),
            merged: BTreeSet::new(),
            merged_queries: RefCell::default(),
            created: RefCell::default(),
            edited: RefCell::default(),
            next_number: Cell::new(100),
        }
    }
}

impl FakePrs {
    pub fn with_open(self, branch: &str, url: &str) -> Self {
        self.open
            .borrow_mut()
            .insert(branch.to_string(), url.to_string());
        self
    }

    pub fn with_merged(mut self, branch: &str) -> Self {
        self.merged.insert(branch.to_string());
        self
    }
}

impl PullRequests for FakePrs {
    fn find_open_pr_url(&self, branch: &str) -> Result<Option<String>> {
        Ok(self.open.borrow().get(branch).cloned())
    }

    fn is_merged(&self, branch: &str) -> Result<bool> {
        self.merged_queries.borrow_mut().push(branch.to_string());
        Ok(self.merged.contains(branch))
    }

    fn create(&self, request: &NewPullRequest<'_>) -> Result<()> {
        let number = self.next_number.get();
        self.next_number.set(number + 1);
        self.open.borrow_mut().insert(
            request.head.to_string(),
            format!("https://github.com/acme/app/pull/{number}"),
        );
        self.created.borrow_mut().push(CreatedPr {
            head: request.head.to_string(),
            base: request.base.to_string(),
            title: request.title.to_string(),
            body: request.body.to_string(),
        });
        Ok(())
    }

    fn edit_body(&self, url: &str, body: &str) -> Result<()> {
        self.edited
            .borrow_mut()
            .push((url.to_string(), body.to_string()));
        Ok(())
    }
}
