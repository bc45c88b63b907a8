pub mod stack;
pub mod stage;

pub use stack::{Config, Stack, Stacks, SCHEMA_VERSION};
pub use stage::{Stage, StageRisk, StageState};
