//! Git worktree management
//!
//! Stage worktrees live under `.m/stacks/<stack>/<stage>`, ad-hoc ones under
//! `.m/worktrees/<branch>`. Both are created with plain `git worktree add`
//! against an existing branch.

pub mod operations;
pub mod parser;
pub mod paths;

pub use operations::{
    add_worktree, copy_root_env_files, list_worktrees, prune_worktrees,
    remove_orphan_managed_worktrees, remove_worktree,
};
pub use parser::{parse_worktree_list, WorktreeInfo};
pub use paths::{is_within_dir, normalize_path};
