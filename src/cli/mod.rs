//! Command-line surface of the `m` binary.

pub mod dispatch;
pub mod types;
mod types_stage;

pub use dispatch::dispatch;
pub use types::Cli;
