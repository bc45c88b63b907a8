use std::path::{Path, PathBuf};

/// Name of the repo-local state directory under the shared root.
pub const STATE_DIR_NAME: &str = ".m";

/// Layout of the `.m/` state directory.
///
/// ```text
/// .m/
/// ├── config.json
/// ├── stacks.json
/// ├── stacks/<stack-name>/<stage-id>/   stage worktrees
/// └── worktrees/<branch>/               ad-hoc worktrees
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateDir {
    root: PathBuf,
}

impl StateDir {
    /// State directory for the repository whose shared root is `repo_root`.
    pub fn new<P: AsRef<Path>>(repo_root: P) -> Self {
        Self {
            root: repo_root.as_ref().join(STATE_DIR_NAME),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.json")
    }

    pub fn stacks_path(&self) -> PathBuf {
        self.root.join("stacks.json")
    }

    pub fn stacks_dir(&self) -> PathBuf {
        self.root.join("stacks")
    }

    pub fn worktrees_dir(&self) -> PathBuf {
        self.root.join("worktrees")
    }

    /// Directory holding every stage worktree of `stack_name`.
    pub fn stack_dir(&self, stack_name: &str) -> PathBuf {
        self.stacks_dir().join(stack_name)
    }

    /// Deterministic worktree path for a stage.
    pub fn stage_worktree_path(&self, stack_name: &str, stage_id: &str) -> PathBuf {
        self.stack_dir(stack_name).join(stage_id)
    }

    /// Default worktree path for an ad-hoc branch; `/` in the branch nests.
    pub fn adhoc_worktree_path(&self, branch: &str) -> PathBuf {
        branch
            .split('/')
            .fold(self.worktrees_dir(), |path, part| path.join(part))
    }
}
