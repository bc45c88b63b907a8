//! Branch naming conventions for stacked stages

/// Remote every stage branch is published to.
pub const REMOTE: &str = "origin";

/// Derive a stage branch name from its stack and position.
///
/// Positions are zero-based; the branch uses the one-based position so
/// `("checkout", 0, "db")` becomes `checkout/1/db`. Callers must recompute
/// this whenever stage order changes.
pub fn stage_branch_name(stack_name: &str, index: usize, stage_id: &str) -> String {
    format!("{}/{}/{}", stack_name.trim_matches('/'), index + 1, stage_id)
}

/// Remote-tracking name of a local branch (`main` -> `origin/main`).
pub fn remote_tracking_name(branch: &str) -> String {
    format!("{REMOTE}/{branch}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_branch_name() {
        assert_eq!(stage_branch_name("checkout", 0, "db"), "checkout/1/db");
        assert_eq!(
            stage_branch_name("/team/checkout/", 2, "ui"),
            "team/checkout/3/ui"
        );
    }

    #[test]
    fn test_stage_branch_name_shifts_with_position() {
        // After pruning the first stage, "api" moves from position 1 to 0.
        assert_eq!(stage_branch_name("feat", 1, "api"), "feat/2/api");
        assert_eq!(stage_branch_name("feat", 0, "api"), "feat/1/api");
    }

    #[test]
    fn test_remote_tracking_name() {
        assert_eq!(remote_tracking_name("feat/1/db"), "origin/feat/1/db");
    }
}
