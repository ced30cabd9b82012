//! JSON file persistence for decision records.

use std::path::{Path, PathBuf};

use super::DecisionRecord;
use crate::error::Result;
use crate::storage::data_dir;

/// Stores one `DecisionRecord` per item as a JSON array.
pub struct DecisionStore {
    path: PathBuf,
}

impl DecisionStore {
    /// Store at `<data_dir>/decisions.json`.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new_with_path(data_dir()?.join("decisions.json")))
    }

    /// Store at a specific path (for testing).
    pub fn new_with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load records. A missing file is an empty set.
    pub fn load(&self) -> Result<Vec<DecisionRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    /// Write records, replacing the previous file.
    pub fn persist(&self, records: &[DecisionRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, data)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
