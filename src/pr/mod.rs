//! Pull-request capability used by the sync and publish engines
//!
//! [`GhCli`] drives the GitHub CLI; tests substitute a fake that records
//! created and edited pull requests.

mod gh;

pub use gh::{require_gh, GhCli};

use crate::errors::Result;

/// Arguments for opening a new pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPullRequest<'a> {
    pub head: &'a str,
    pub base: &'a str,
    pub title: &'a str,
    pub body: &'a str,
}

pub trait PullRequests {
    /// URL of the first open PR whose head is `branch`.
    fn find_open_pr_url(&self, branch: &str) -> Result<Option<String>>;

    /// True if a merged PR exists whose head is `branch`.
    fn is_merged(&self, branch: &str) -> Result<bool>;

    fn create(&self, request: &NewPullRequest<'_>) -> Result<()>;

    fn edit_body(&self, url: &str, body: &str) -> Result<()>;
}
