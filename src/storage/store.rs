use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CallSheetError, Result};

/// Extension used for persisted call sheets.
pub(crate) const SHEET_EXTENSION: &str = "json";

/// Handle on the directory that holds persisted call sheets. Opening the store
/// creates the directory, so every later operation can assume it exists.
#[derive(Debug, Clone)]
pub struct CallSheetStore {
    root: PathBuf,
}

impl CallSheetStore {
    /// Ensure the data directory exists and return a handle to it.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|err| CallSheetError::io(&root, err))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file backing an already sanitized identifier.
    pub(crate) fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.{SHEET_EXTENSION}"))
    }

    /// Whether a call sheet with this identifier is on disk.
    pub fn exists(&self, name: &str) -> bool {
        super::sheet_name(name)
            .map(|name| self.path_for(&name).is_file())
            .unwrap_or(false)
    }
}
