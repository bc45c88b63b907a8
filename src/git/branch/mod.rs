//! Git branch management operations
//!
//! - `operations`: create, delete, existence checks, push, default branch
//! - `ancestry`: commit resolution and ancestry queries
//! - `naming`: stage branch naming conventions

mod ancestry;
mod naming;
mod operations;

pub use ancestry::{commit_exists, is_ancestor, merge_base};
pub use naming::{remote_tracking_name, stage_branch_name, REMOTE};
pub use operations::{
    branch_exists, create_branch, current_branch, default_branch, delete_branch, push_branch,
    remote_branch_exists,
};
