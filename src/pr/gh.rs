use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use super::{NewPullRequest, PullRequests};
use crate::errors::{Result, StackError};
use crate::process::run_checked;

const GH: &str = "gh";

/// Fail with `ToolMissing` unless `gh` is on `PATH`.
pub fn require_gh(purpose: &str) -> Result<()> {
    which::which(GH).map(|_| ()).map_err(|_| StackError::ToolMissing {
        tool: GH.to_string(),
        hint: format!("the GitHub CLI is required for {purpose}"),
    })
}

#[derive(Debug, Deserialize)]
struct PrListEntry {
    #[serde(default)]
    url: String,
}

fn parse_pr_list(output: &str) -> Result<Vec<PrListEntry>> {
    serde_json::from_str(output).map_err(|source| StackError::Json {
        what: "gh pr list output",
        source,
    })
}

/// [`PullRequests`] backed by the `gh` binary.
#[derive(Debug, Clone)]
pub struct GhCli {
    dir: PathBuf,
}

impl GhCli {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        run_checked(GH, args, Path::new(&self.dir))
    }

    fn list(&self, state: &str, branch: &str, field: &str) -> Result<Vec<PrListEntry>> {
        let output = self.run(&[
            "pr", "list", "--state", state, "--head", branch, "--json", field, "--limit", "1",
        ])?;
        parse_pr_list(&output)
    }
}

impl PullRequests for GhCli {
    fn find_open_pr_url(&self, branch: &str) -> Result<Option<String>> {
        let prs = self.list("open", branch, "url")?;
        Ok(prs
            .into_iter()
            .next()
            .map(|pr| pr.url.trim().to_string())
            .filter(|url| !url.is_empty()))
    }

    fn is_merged(&self, branch: &str) -> Result<bool> {
        Ok(!self.list("merged", branch, "number")?.is_empty())
    }

    fn create(&self, request: &NewPullRequest<'_>) -> Result<()> {
        info!(head = request.head, base = request.base, "creating pull request");
        self.run(&[
            "pr",
            "create",
            "--head",
            request.head,
            "--base",
            request.base,
            "--title",
            request.title,
            "--body",
            request.body,
        ])?;
        Ok(())
    }

    fn edit_body(&self, url: &str, body: &str) -> Result<()> {
        info!(url, "updating pull request body");
        self.run(&["pr", "edit", url, "--body", body])?;
        Ok(())
    }
}
