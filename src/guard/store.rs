//! Persistence for the daily escalation record

use std::fs;
use std::path::{Path, PathBuf};

use super::escalation::EscalationState;
use crate::error::StoreError;

/// Where the escalation record lives between runs
pub trait StateStore: Send {
    /// Load the stored record, `Ok(None)` when nothing has been saved yet
    fn load(&self) -> Result<Option<EscalationState>, StoreError>;

    /// Overwrite the stored record
    fn save(&mut self, state: &EscalationState) -> Result<(), StoreError>;
}

/// JSON file store
///
/// Saves go to a sibling `.tmp` file which is then renamed over the target,
/// so a crash mid-write never leaves a truncated record behind.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_error(&self, e: impl std::fmt::Display) -> StoreError {
        StoreError::Write {
            path: self.path.display().to_string(),
            message: e.to_string(),
        }
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<Option<EscalationState>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path).map_err(|e| StoreError::Read {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;

        let state = serde_json::from_str(&contents).map_err(|e| StoreError::Parse {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;

        Ok(Some(state))
    }

    fn save(&mut self, state: &EscalationState) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| self.write_error(e))?;
            }
        }

        let json = serde_json::to_string_pretty(state).map_err(|e| self.write_error(e))?;
        let tmp = self.temp_path();
        fs::write(&tmp, json).map_err(|e| self.write_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.write_error(e))?;

        tracing::debug!("Saved escalation state to {}", self.path.display());
        Ok(())
    }
}

/// In-memory store for tests and sessions that should not persist
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Option<EscalationState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing record, as if loaded from disk
    pub fn with_state(state: EscalationState) -> Self {
        Self { state: Some(state) }
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<Option<EscalationState>, StoreError> {
        Ok(self.state.clone())
    }

    fn save(&mut self, state: &EscalationState) -> Result<(), StoreError> {
        self.state = Some(state.clone());
        Ok(())
    }
}
