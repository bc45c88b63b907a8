pub mod agent;
pub mod commands;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod git;
pub mod models;
pub mod plan;
pub mod pr;
pub mod process;
pub mod validation;
