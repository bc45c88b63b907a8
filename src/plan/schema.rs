//! Plan frontmatter schema and validation

use serde::Deserialize;

use crate::errors::{Result, StackError};
use crate::models::{Stage, StageRisk};
use crate::validation::is_valid_stage_id;

/// Version with detailed per-stage fields in the frontmatter.
pub const DETAILED_VERSION: u32 = 2;
/// Version with free-form per-stage context sections in the body.
pub const CONTEXT_VERSION: u32 = 3;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanFile {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub stages: Vec<PlanStage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanStage {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub outcome: String,
    #[serde(default)]
    pub implementation: Vec<String>,
    #[serde(default)]
    pub validation: Vec<String>,
    #[serde(default)]
    pub risks: Vec<StageRisk>,
    /// Filled from the body's `## Stage: <id>` section, never from YAML.
    #[serde(skip)]
    pub context: String,
}

fn invalid(message: String) -> StackError {
    StackError::Plan(message)
}

fn validate_string_list(items: &[String]) -> std::result::Result<(), String> {
    if items.is_empty() {
        return Err("must include at least one item".to_string());
    }
    if let Some(pos) = items.iter().position(|item| item.trim().is_empty()) {
        return Err(format!("item {} is empty", pos + 1));
    }
    Ok(())
}

fn validate_detailed_stage(id: &str, stage: &PlanStage) -> Result<()> {
    if stage.outcome.trim().is_empty() {
        return Err(invalid(format!("stage {id:?} is missing outcome")));
    }
    validate_string_list(&stage.implementation)
        .map_err(|e| invalid(format!("stage {id:?} has invalid implementation list: {e}")))?;
    validate_string_list(&stage.validation)
        .map_err(|e| invalid(format!("stage {id:?} has invalid validation list: {e}")))?;
    if stage.risks.is_empty() {
        return Err(invalid(format!("stage {id:?} must include at least one risk")));
    }
    for (pos, risk) in stage.risks.iter().enumerate() {
        if risk.risk.trim().is_empty() {
            return Err(invalid(format!("stage {id:?} risk {} is missing risk", pos + 1)));
        }
        if risk.mitigation.trim().is_empty() {
            return Err(invalid(format!(
                "stage {id:?} risk {} is missing mitigation",
                pos + 1
            )));
        }
    }
    Ok(())
}

/// Check a parsed plan, reporting the first problem found.
pub fn validate(plan: &PlanFile) -> Result<()> {
    if plan.version != DETAILED_VERSION && plan.version != CONTEXT_VERSION {
        return Err(invalid("plan version must be 2 or 3".to_string()));
    }
    if plan.stages.is_empty() {
        return Err(invalid("plan must include at least one stage".to_string()));
    }

    let mut seen = std::collections::HashSet::new();
    for (pos, stage) in plan.stages.iter().enumerate() {
        let id = stage.id.trim();
        if id.is_empty() {
            return Err(invalid(format!("stage {} is missing id", pos + 1)));
        }
        if !is_valid_stage_id(id) {
            return Err(invalid(format!(
                "stage {id:?} has invalid id; use kebab-case letters/numbers"
            )));
        }
        if stage.title.trim().is_empty() {
            return Err(invalid(format!("stage {id:?} is missing title")));
        }

        if plan.version == DETAILED_VERSION {
            validate_detailed_stage(id, stage)?;
        }
        if plan.version == CONTEXT_VERSION && stage.context.trim().is_empty() {
            return Err(invalid(format!("stage {id:?} is missing context section")));
        }

        if !seen.insert(id) {
            return Err(invalid(format!("duplicate stage id {id:?}")));
        }
    }
    Ok(())
}

impl PlanStage {
    /// Convert into a stack stage, dropping blank optional text.
    pub fn into_stage(self) -> Stage {
        let non_blank = |s: String| {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };
        Stage {
            id: self.id.trim().to_string(),
            title: self.title.trim().to_string(),
            outcome: non_blank(self.outcome),
            implementation: self.implementation,
            validation: self.validation,
            risks: self.risks,
            context: non_blank(self.context),
            ..Stage::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detailed_stage(id: &str) -> PlanStage {
        PlanStage {
            id: id.to_string(),
            title: "Foundation".to_string(),
            outcome: "Contracts exist".to_string(),
            implementation: vec!["add interfaces".to_string()],
            validation: vec!["cargo test".to_string()],
            risks: vec![StageRisk {
                risk: "drift".to_string(),
                mitigation: "fixtures".to_string(),
            }],
            context: String::new(),
        }
    }

    fn message(plan: &PlanFile) -> String {
        validate(plan).unwrap_err().to_string()
    }

    #[test]
    fn test_validate_accepts_detailed_plan() {
        let plan = PlanFile {
            version: 2,
            title: String::new(),
            stages: vec![detailed_stage("foundation"), detailed_stage("api")],
        };
        assert!(validate(&plan).is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_version() {
        let plan = PlanFile {
            version: 1,
            stages: vec![detailed_stage("a")],
            ..PlanFile::default()
        };
        assert!(message(&plan).contains("version must be 2 or 3"));
    }

    #[test]
    fn test_validate_requires_detailed_fields() {
        let mut stage = detailed_stage("foundation");
        stage.outcome = String::new();
        let plan = PlanFile {
            version: 2,
            stages: vec![stage],
            ..PlanFile::default()
        };
        assert!(message(&plan).contains("missing outcome"));
    }

    #[test]
    fn test_validate_rejects_blank_list_item() {
        let mut stage = detailed_stage("foundation");
        stage.validation.push("   ".to_string());
        let plan = PlanFile {
            version: 2,
            stages: vec![stage],
            ..PlanFile::default()
        };
        assert!(message(&plan).contains("invalid validation list: item 2 is empty"));
    }

    #[test]
    fn test_validate_rejects_bad_and_duplicate_ids() {
        let plan = PlanFile {
            version: 2,
            stages: vec![detailed_stage("Bad_Id")],
            ..PlanFile::default()
        };
        assert!(message(&plan).contains("invalid id"));

        let plan = PlanFile {
            version: 2,
            stages: vec![detailed_stage("a"), detailed_stage("a")],
            ..PlanFile::default()
        };
        assert!(message(&plan).contains("duplicate stage id"));
    }

    #[test]
    fn test_context_version_requires_context_only() {
        let mut stage = PlanStage {
            id: "a".to_string(),
            title: "A".to_string(),
            ..PlanStage::default()
        };
        let plan = PlanFile {
            version: 3,
            stages: vec![stage.clone()],
            ..PlanFile::default()
        };
        assert!(message(&plan).contains("missing context section"));

        stage.context = "Do the thing.".to_string();
        let plan = PlanFile {
            version: 3,
            stages: vec![stage],
            ..PlanFile::default()
        };
        assert!(validate(&plan).is_ok());
    }

    #[test]
    fn test_into_stage_drops_blank_text() {
        let mut stage = detailed_stage(" a ");
        stage.outcome = "  ".to_string();
        let converted = stage.into_stage();
        assert_eq!(converted.id, "a");
        assert_eq!(converted.outcome, None);
        assert_eq!(converted.context, None);
        assert!(converted.branch.is_none());
    }
}
