use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::stage::Stage;
use crate::errors::{Result, StackError};
use crate::git::branch::stage_branch_name;
use crate::git::worktree::paths::{is_within_dir, normalize_path};

/// Current on-disk schema version for both state documents.
pub const SCHEMA_VERSION: u32 = 1;

fn default_version() -> u32 {
    SCHEMA_VERSION
}

/// Root document of `.m/stacks.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stacks {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub stacks: Vec<Stack>,
}

impl Default for Stacks {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION,
            stacks: Vec::new(),
        }
    }
}

/// Root document of `.m/config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_stack: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION,
            current_stack: None,
        }
    }
}

impl Config {
    pub fn selected_stack(&self) -> Option<&str> {
        self.current_stack
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// A named, ordered sequence of dependent stages.
///
/// Stage `i` always builds on stage `i - 1`, or on the default branch for
/// the first stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stack {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub stack_type: Option<String>,
    #[serde(default)]
    pub plan_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_stage: Option<String>,
    #[serde(default)]
    pub stages: Vec<Stage>,
}

impl Stack {
    pub fn new(name: impl Into<String>, plan_file: impl Into<String>, stages: Vec<Stage>) -> Self {
        Self {
            name: name.into(),
            stack_type: None,
            plan_file: plan_file.into(),
            created_at: Some(Utc::now()),
            current_stage: None,
            stages,
        }
    }

    pub fn has_plan(&self) -> bool {
        !self.plan_file.trim().is_empty() && !self.stages.is_empty()
    }

    pub fn has_started_stages(&self) -> bool {
        self.stages.iter().any(Stage::is_started)
    }

    pub fn find_stage(&self, id: &str) -> Option<(usize, &Stage)> {
        self.stages.iter().enumerate().find(|(_, s)| s.id == id)
    }

    /// Selected stage id, ignoring blank values.
    pub fn selected_stage(&self) -> Option<&str> {
        self.current_stage
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Branch for the stage at `index`: the recorded branch, or the derived
    /// name for its current position.
    pub fn stage_branch(&self, index: usize) -> String {
        let stage = &self.stages[index];
        match stage.recorded_branch() {
            Some(branch) => branch.to_string(),
            None => stage_branch_name(&self.name, index, &stage.id),
        }
    }

    /// Stage owning `workspace`, falling back to the selected stage.
    pub fn effective_current_stage(&self, workspace: &Path) -> Option<&str> {
        if let Some(stage) = self.stage_for_worktree(workspace) {
            return Some(stage.id.trim());
        }
        self.selected_stage()
    }

    pub fn stage_for_worktree(&self, workspace: &Path) -> Option<&Stage> {
        let workspace = normalize_path(workspace)?;
        self.stages.iter().find(|stage| {
            stage
                .recorded_worktree()
                .and_then(normalize_path)
                .is_some_and(|p| p == workspace)
        })
    }

    /// Index of the stage after the selected one, or 0 when nothing is selected.
    pub fn next_stage_index(&self) -> Result<usize> {
        let Some(current) = self.selected_stage() else {
            return Ok(0);
        };
        let (index, _) = self
            .find_stage(current)
            .ok_or_else(|| StackError::StageNotFound {
                stage: current.to_string(),
                stack: self.name.clone(),
            })?;
        if index + 1 >= self.stages.len() {
            return Err(StackError::AlreadyAtFinalStage {
                stage: current.to_string(),
            });
        }
        Ok(index + 1)
    }
}

impl Stacks {
    pub fn find_stack(&self, name: &str) -> Option<&Stack> {
        self.stacks.iter().find(|s| s.name == name)
    }

    pub fn find_stack_mut(&mut self, name: &str) -> Option<&mut Stack> {
        self.stacks.iter_mut().find(|s| s.name == name)
    }

    pub fn require_stack(&self, name: &str) -> Result<&Stack> {
        self.find_stack(name).ok_or_else(|| StackError::StackNotFound {
            name: name.to_string(),
        })
    }

    pub fn require_stack_mut(&mut self, name: &str) -> Result<&mut Stack> {
        self.find_stack_mut(name)
            .ok_or_else(|| StackError::StackNotFound {
                name: name.to_string(),
            })
    }

    /// Remove a stack by name, returning it.
    pub fn remove_stack(&mut self, name: &str) -> Result<Stack> {
        let index = self
            .stacks
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| StackError::StackNotFound {
                name: name.to_string(),
            })?;
        Ok(self.stacks.remove(index))
    }

    /// `(stack, stage)` whose recorded worktree is `workspace`.
    pub fn workspace_stack_stage(&self, workspace: &Path) -> Option<(&str, &str)> {
        self.stacks.iter().find_map(|stack| {
            stack
                .stage_for_worktree(workspace)
                .map(|stage| (stack.name.as_str(), stage.id.as_str()))
        })
    }

    /// Stack whose stage directory `stacks_dir/<stack-name>` contains `workspace`.
    ///
    /// Stack names may contain `/`, so the longest matching name wins.
    pub fn stack_for_path(&self, stacks_dir: &Path, workspace: &Path) -> Option<&Stack> {
        self.stacks
            .iter()
            .filter(|stack| is_within_dir(workspace, &stacks_dir.join(&stack.name)))
            .max_by_key(|stack| stack.name.len())
    }

    /// Clear stage worktree references for which `exists` returns false.
    ///
    /// Returns the number of references cleared.
    pub fn clear_missing_stage_worktrees(&mut self, exists: impl Fn(&Path) -> bool) -> usize {
        let mut cleared = 0;
        for stage in self.stacks.iter_mut().flat_map(|s| s.stages.iter_mut()) {
            let Some(worktree) = stage.recorded_worktree() else {
                continue;
            };
            if exists(worktree) {
                continue;
            }
            stage.worktree = None;
            cleared += 1;
        }
        cleared
    }
}
