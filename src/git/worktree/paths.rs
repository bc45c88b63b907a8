//! Path normalisation for comparing worktree locations

use std::path::{Path, PathBuf};

/// Normalise a path for comparison.
///
/// Relative paths are resolved against the current directory and symlinks
/// are resolved when the path exists. Blank paths yield `None`.
///
/// # Examples
///
/// ```
/// use std::path::{Path, PathBuf};
/// use mstack::git::worktree::paths::normalize_path;
///
/// assert_eq!(normalize_path(Path::new("")), None);
/// assert_eq!(
///     normalize_path(Path::new("/no/such/dir/../wt")),
///     Some(PathBuf::from("/no/such/wt"))
/// );
/// ```
pub fn normalize_path(path: &Path) -> Option<PathBuf> {
    if path.as_os_str().to_string_lossy().trim().is_empty() {
        return None;
    }
    if let Ok(resolved) = path.canonicalize() {
        return Some(resolved);
    }
    let absolute = std::path::absolute(path).ok()?;
    Some(lexical_clean(&absolute))
}

/// True if `path` is `root` or lies beneath it.
pub fn is_within_dir(path: &Path, root: &Path) -> bool {
    match (normalize_path(path), normalize_path(root)) {
        (Some(path), Some(root)) => path.starts_with(root),
        _ => false,
    }
}

/// Resolve `.` and `..` components without touching the filesystem.
fn lexical_clean(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                cleaned.pop();
            }
            other => cleaned.push(other.as_os_str()),
        }
    }
    cleaned
}
