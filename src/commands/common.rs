//! Repository context and stack resolution shared by every command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::errors::StackError;
use crate::fs::{StateDir, StateStore};
use crate::git::{discover_repo, GitCli, RepoInfo};
use crate::models::{Config, Stacks};
use crate::pr::GhCli;

/// Where a command was run from, resolved once at startup.
#[derive(Debug, Clone)]
pub struct RepoContext {
    /// Shared root: holds `.m/` and is where git commands run.
    pub root: PathBuf,
    /// Top level of the worktree the command was run from.
    pub worktree: PathBuf,
    pub common_dir: PathBuf,
    pub default_branch: String,
    linked: bool,
}

impl RepoContext {
    pub fn discover() -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        Self::from_dir(&cwd)
    }

    pub fn from_dir(dir: &Path) -> Result<Self> {
        let info: RepoInfo = discover_repo(dir).context("discover repo")?;
        Ok(Self {
            root: info.shared_root(),
            linked: info.is_linked_worktree(),
            worktree: info.top_level,
            common_dir: info.common_dir,
            default_branch: info.default_branch,
        })
    }

    pub fn state_dir(&self) -> StateDir {
        StateDir::new(&self.root)
    }

    pub fn store(&self) -> StateStore {
        StateStore::new(self.state_dir())
    }

    pub fn is_linked_worktree(&self) -> bool {
        self.linked
    }

    pub fn vcs(&self) -> GitCli {
        GitCli::new(&self.root)
    }

    pub fn prs(&self) -> GhCli {
        GhCli::new(&self.root)
    }

    /// Initialise `.m/` if needed and load both documents.
    pub fn load_state(&self) -> Result<(Config, Stacks)> {
        let store = self.store();
        store.ensure_initialized()?;
        let config = store.load_config()?;
        let stacks = store.load_stacks()?;
        Ok((config, stacks))
    }

    /// Stack and stage owning the current worktree, if any.
    pub fn workspace_stack_stage<'a>(&self, stacks: &'a Stacks) -> Option<(&'a str, &'a str)> {
        stacks.workspace_stack_stage(&self.worktree)
    }
}

/// Work out which stack a command applies to.
///
/// In order: the explicit override, the `.m/stacks/<stack>/` directory the
/// workspace sits in, the stage whose worktree is the workspace, the stack
/// selected in config (primary worktree only), and finally the only stack
/// when there is exactly one.
pub fn resolve_stack_name(
    repo: &RepoContext,
    config: &Config,
    stacks: &Stacks,
    override_name: Option<&str>,
) -> Result<Option<String>, StackError> {
    if let Some(name) = override_name.map(str::trim).filter(|n| !n.is_empty()) {
        return stacks.require_stack(name).map(|s| Some(s.name.clone()));
    }

    if let Some(stack) = stacks.stack_for_path(&repo.state_dir().stacks_dir(), &repo.worktree) {
        return Ok(Some(stack.name.clone()));
    }

    if let Some((stack, _)) = repo.workspace_stack_stage(stacks) {
        return Ok(Some(stack.to_string()));
    }

    if repo.is_linked_worktree() {
        return Ok(None);
    }

    if let Some(selected) = config.selected_stack() {
        if let Some(stack) = stacks.find_stack(selected) {
            return Ok(Some(stack.name.clone()));
        }
    }

    if let [only] = stacks.stacks.as_slice() {
        return Ok(Some(only.name.clone()));
    }
    Ok(None)
}

pub fn require_stack_name(
    repo: &RepoContext,
    config: &Config,
    stacks: &Stacks,
    override_name: Option<&str>,
) -> Result<String, StackError> {
    resolve_stack_name(repo, config, stacks, override_name)?.ok_or(StackError::NoStackInferred)
}

/// Like [`require_stack_name`], but the stack must have a plan attached.
pub fn require_stack_with_plan(
    repo: &RepoContext,
    config: &Config,
    stacks: &Stacks,
    override_name: Option<&str>,
) -> Result<String, StackError> {
    let name = require_stack_name(repo, config, stacks, override_name)?;
    let stack = stacks.require_stack(&name)?;
    if !stack.has_plan() {
        return Err(StackError::NoPlanAttached { stack: name });
    }
    Ok(name)
}
