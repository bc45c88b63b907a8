//! Plan parsing and schema validation
//!
//! A plan is a markdown file whose YAML frontmatter lists the stages of a
//! stack. Version 3 plans keep each stage's context in `## Stage: <id>`
//! sections of the body instead of detailed frontmatter fields.

pub mod parser;
pub mod schema;

use std::path::Path;

pub use parser::{parse_plan, parse_plan_content};
pub use schema::{validate, PlanFile, PlanStage};

use crate::errors::Result;
use crate::models::Stage;

/// Parse a plan file into stack stages, in plan order.
pub fn load_plan_stages(path: &Path) -> Result<Vec<Stage>> {
    let plan = parse_plan(path)?;
    Ok(plan.stages.into_iter().map(PlanStage::into_stage).collect())
}
