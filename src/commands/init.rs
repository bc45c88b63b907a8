//! `m init`: create `.m/` and keep it out of `git status`.

use anyhow::Result;

use super::common::RepoContext;
use super::output;
use crate::fs::local_exclude::ensure_pattern;
use crate::fs::STATE_DIR_NAME;

pub fn execute() -> Result<()> {
    let repo = RepoContext::discover()?;
    let store = repo.store();
    store.ensure_initialized()?;

    if ensure_pattern(&repo.common_dir, &format!("{STATE_DIR_NAME}/"))? {
        output::info(format!("Added {STATE_DIR_NAME}/ to info/exclude"));
    }

    output::success(format!(
        "Initialized m state at {}",
        store.dir().root().display()
    ));
    Ok(())
}
