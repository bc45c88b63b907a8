use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A risk carried through from the plan, rendered into PR descriptions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageRisk {
    pub risk: String,
    pub mitigation: String,
}

/// One ordered unit of a stack.
///
/// Descriptive fields come from the plan and are opaque to orchestration.
/// `branch`, `worktree` and `parent` are filled in once the stage is started;
/// see [`Stage::state`] for the lifecycle view over them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub implementation: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub risks: Vec<StageRisk>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worktree: Option<PathBuf>,
    /// Branch this stage was last rebased onto.
    #[serde(
        rename = "parent_branch",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub parent: Option<String>,
}

/// Lifecycle of a stage as encoded by its recorded fields.
///
/// Published and merged are properties of the remote, not of the record, so
/// they are discovered by the sync and publish engines rather than stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState<'a> {
    Unstarted,
    Started {
        branch: &'a str,
        worktree: Option<&'a Path>,
        parent: Option<&'a str>,
    },
}

impl Stage {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    /// Recorded branch, ignoring blank values.
    pub fn recorded_branch(&self) -> Option<&str> {
        non_blank(self.branch.as_deref())
    }

    /// Recorded worktree path, ignoring blank values.
    pub fn recorded_worktree(&self) -> Option<&Path> {
        self.worktree
            .as_deref()
            .filter(|p| !p.as_os_str().to_string_lossy().trim().is_empty())
    }

    pub fn recorded_parent(&self) -> Option<&str> {
        non_blank(self.parent.as_deref())
    }

    pub fn outcome_text(&self) -> Option<&str> {
        non_blank(self.outcome.as_deref())
    }

    pub fn context_text(&self) -> Option<&str> {
        non_blank(self.context.as_deref())
    }

    pub fn state(&self) -> StageState<'_> {
        match self.recorded_branch() {
            None => StageState::Unstarted,
            Some(branch) => StageState::Started {
                branch,
                worktree: self.recorded_worktree(),
                parent: self.recorded_parent(),
            },
        }
    }

    pub fn is_started(&self) -> bool {
        matches!(self.state(), StageState::Started { .. })
    }

    /// Whether the plan supplied anything worth rendering in a PR body.
    pub fn has_details(&self) -> bool {
        self.outcome_text().is_some()
            || !self.implementation.is_empty()
            || !self.validation.is_empty()
            || !self.risks.is_empty()
            || self.context_text().is_some()
    }

    /// Record the branch, worktree and parent after a successful start or rebase.
    pub fn record_checkout(&mut self, branch: &str, worktree: &Path, parent: &str) {
        self.branch = Some(branch.to_string());
        self.worktree = Some(worktree.to_path_buf());
        self.parent = Some(parent.to_string());
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
