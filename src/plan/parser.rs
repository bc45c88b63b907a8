//! Plan document parser: YAML frontmatter plus markdown body

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::schema::{validate, PlanFile, CONTEXT_VERSION};
use crate::errors::{Result, StackError};

static STAGE_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^##\s+Stage:[ \t]*(.*?)[ \t]*$").expect("stage heading pattern is a valid regex")
});

fn invalid(message: impl Into<String>) -> StackError {
    StackError::Plan(message.into())
}

/// Parse and validate a plan file. Only markdown files are accepted.
pub fn parse_plan(path: &Path) -> Result<PlanFile> {
    let is_markdown = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"));
    if !is_markdown {
        return Err(invalid(format!(
            "plan file must be a markdown (.md) file: {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)?;
    parse_plan_content(&content)
}

/// Parse plan content (for testing without file system)
pub fn parse_plan_content(content: &str) -> Result<PlanFile> {
    let (frontmatter, body) = split_frontmatter(content)?;

    let mut plan: PlanFile = serde_yaml::from_str(&frontmatter)
        .map_err(|e| invalid(format!("parse plan frontmatter: {e}")))?;

    if plan.version == CONTEXT_VERSION {
        let mut contexts = extract_stage_contexts(&body)?;
        for stage in &mut plan.stages {
            if let Some(context) = contexts.remove(stage.id.trim()) {
                stage.context = context;
            }
        }
        // Anything left over names a stage the frontmatter does not declare.
        if let Some(unknown) = contexts.keys().min() {
            return Err(invalid(format!(
                "stage context section references unknown stage {unknown:?}"
            )));
        }
    }

    validate(&plan)?;
    Ok(plan)
}

/// Split `---` delimited frontmatter from the body. Both are trimmed.
fn split_frontmatter(raw: &str) -> Result<(String, String)> {
    let normalized = raw.replace("\r\n", "\n");
    let Some(remaining) = normalized.strip_prefix("---\n") else {
        return Err(invalid(
            "plan file must start with YAML frontmatter delimited by ---",
        ));
    };

    let (frontmatter, body) = match remaining.find("\n---\n") {
        Some(end) => (&remaining[..end], &remaining[end + "\n---\n".len()..]),
        None => match remaining.strip_suffix("\n---") {
            Some(frontmatter) => (frontmatter, ""),
            None => {
                return Err(invalid(
                    "plan file is missing closing frontmatter delimiter ---",
                ))
            }
        },
    };

    let frontmatter = frontmatter.trim();
    if frontmatter.is_empty() {
        return Err(invalid("plan frontmatter is empty"));
    }
    Ok((frontmatter.to_string(), body.trim().to_string()))
}

/// Collect `## Stage: <id>` sections keyed by id.
///
/// A section runs until the next stage heading or the end of the body.
fn extract_stage_contexts(body: &str) -> Result<HashMap<String, String>> {
    let mut contexts = HashMap::new();
    let headings: Vec<_> = STAGE_HEADING.captures_iter(body).collect();

    for (pos, caps) in headings.iter().enumerate() {
        let (Some(heading), Some(id)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let id = id.as_str().trim();
        if id.is_empty() {
            return Err(invalid("stage context heading is missing stage id"));
        }

        let end = headings
            .get(pos + 1)
            .and_then(|next| next.get(0))
            .map_or(body.len(), |next| next.start());
        let section = body[heading.end()..end].trim().to_string();

        if contexts.insert(id.to_string(), section).is_some() {
            return Err(invalid(format!(
                "duplicate stage context section for {id:?}"
            )));
        }
    }
    Ok(contexts)
}
