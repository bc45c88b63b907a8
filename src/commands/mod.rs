pub mod common;
pub mod init;
pub mod output;
pub mod stack;
pub mod stage;
pub mod status;
pub mod worktree_cmd;
