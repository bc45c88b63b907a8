//! Input validation for stack names and stage ids.
//!
//! Stack names become branch namespaces and directory paths under `.m/stacks/`,
//! so they are checked before they reach git or the filesystem.

use std::sync::LazyLock;

use regex::Regex;

use crate::errors::{Result, StackError};

static STAGE_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("stage id pattern is a valid regex")
});

/// Validates a stack name.
///
/// A name is valid if, after trimming, it:
/// - is not empty
/// - contains no spaces
/// - does not start or end with `/`
/// - contains no empty path segments (`//`)
///
/// # Examples
///
/// ```
/// use mstack::validation::validate_stack_name;
///
/// assert!(validate_stack_name("checkout").is_ok());
/// assert!(validate_stack_name("team/checkout").is_ok());
/// assert!(validate_stack_name("/checkout").is_err());
/// ```
pub fn validate_stack_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(StackError::InvalidStackName(
            "stack name cannot be empty".to_string(),
        ));
    }
    if trimmed.contains(' ') {
        return Err(StackError::InvalidStackName(
            "stack name cannot contain spaces".to_string(),
        ));
    }
    if trimmed.starts_with('/') || trimmed.ends_with('/') {
        return Err(StackError::InvalidStackName(
            "stack name cannot start or end with /".to_string(),
        ));
    }
    if trimmed.contains("//") {
        return Err(StackError::InvalidStackName(
            "stack name cannot contain empty path segments".to_string(),
        ));
    }

    Ok(())
}

/// True if `id` is kebab-case letters and digits.
pub fn is_valid_stage_id(id: &str) -> bool {
    STAGE_ID_PATTERN.is_match(id)
}

/// Clap value parser for stack name arguments.
pub fn clap_stack_name_validator(s: &str) -> std::result::Result<String, String> {
    validate_stack_name(s).map_err(|e| e.to_string())?;
    Ok(s.trim().to_string())
}

/// Clap value parser for stage id arguments.
pub fn clap_stage_id_validator(s: &str) -> std::result::Result<String, String> {
    let trimmed = s.trim();
    if !is_valid_stage_id(trimmed) {
        return Err(format!(
            "stage id '{trimmed}' is invalid; use kebab-case letters/numbers"
        ));
    }
    Ok(trimmed.to_string())
}
