//! Persisted state store
//!
//! `stacks.json` and `config.json` are read once at the start of a command
//! and written at most once at the end. Writes go to a temp file in the same
//! directory which is then renamed over the target, so a crash mid-write
//! leaves the previous document intact.
//!
//! There is no cross-process locking; two concurrent invocations against the
//! same repository can lose each other's updates.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::debug;

use super::state_dir::StateDir;
use crate::errors::{Result, StackError};
use crate::models::{Config, Stacks, SCHEMA_VERSION};

/// Load and save handle for one repository's state directory.
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: StateDir,
}

impl StateStore {
    pub fn new(dir: StateDir) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &StateDir {
        &self.dir
    }

    /// Create `.m/` and default documents where missing. Existing files are
    /// left untouched.
    pub fn ensure_initialized(&self) -> Result<()> {
        fs::create_dir_all(self.dir.root())?;
        if !self.dir.config_path().exists() {
            write_json_atomic(&self.dir.config_path(), &Config::default(), "config")?;
        }
        if !self.dir.stacks_path().exists() {
            write_json_atomic(&self.dir.stacks_path(), &Stacks::default(), "stacks")?;
        }
        Ok(())
    }

    pub fn load_stacks(&self) -> Result<Stacks> {
        load_stacks(&self.dir.stacks_path())
    }

    pub fn save_stacks(&self, stacks: &mut Stacks) -> Result<()> {
        save_stacks(&self.dir.stacks_path(), stacks)
    }

    pub fn load_config(&self) -> Result<Config> {
        let mut config: Config = read_json(&self.dir.config_path(), "config")?.unwrap_or_default();
        if config.version == 0 {
            config.version = SCHEMA_VERSION;
        }
        Ok(config)
    }

    pub fn save_config(&self, config: &mut Config) -> Result<()> {
        if config.version == 0 {
            config.version = SCHEMA_VERSION;
        }
        write_json_atomic(&self.dir.config_path(), config, "config")
    }
}

/// Load a stacks document, returning an empty one if the file is missing.
pub fn load_stacks(path: &Path) -> Result<Stacks> {
    let mut stacks: Stacks = read_json(path, "stacks")?.unwrap_or_default();
    if stacks.version == 0 {
        stacks.version = SCHEMA_VERSION;
    }
    Ok(stacks)
}

/// Atomically save a stacks document, backfilling the schema version.
pub fn save_stacks(path: &Path, stacks: &mut Stacks) -> Result<()> {
    if stacks.version == 0 {
        stacks.version = SCHEMA_VERSION;
    }
    debug!(path = %path.display(), stacks = stacks.stacks.len(), "saving state");
    write_json_atomic(path, stacks, "stacks")
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &'static str) -> Result<Option<T>> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    serde_json::from_slice(&data)
        .map(Some)
        .map_err(|source| StackError::Json { what, source })
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T, what: &'static str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut data =
        serde_json::to_vec_pretty(value).map_err(|source| StackError::Json { what, source })?;
    data.push(b'\n');

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(&data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StackError::Io(e.error))?;
    Ok(())
}
