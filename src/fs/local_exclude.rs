//! Keep the state directory out of `git status` via `info/exclude`.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::errors::Result;

/// Ensure `pattern` is listed in `<common_dir>/info/exclude`.
///
/// Returns true if the pattern was added.
pub fn ensure_pattern(common_dir: &Path, pattern: &str) -> Result<bool> {
    let exclude_path = common_dir.join("info").join("exclude");
    if let Some(parent) = exclude_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let existing = match fs::read_to_string(&exclude_path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };
    if existing.lines().any(|line| line.trim() == pattern) {
        return Ok(false);
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&exclude_path)?;
    if !existing.is_empty() && !existing.ends_with('\n') {
        file.write_all(b"\n")?;
    }
    writeln!(file, "{pattern}")?;
    Ok(true)
}
