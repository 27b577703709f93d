//! Filesystem layout of the application. Everything lives under one root so a
//! user can back up or move their call sheets by copying a single folder.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;

/// Folder name used beneath the user's home directory for application data.
const APP_DIR_NAME: &str = ".callsheet-maker";
/// Environment variable that relocates the application root.
pub const HOME_ENV: &str = "CALLSHEET_HOME";

const DATA_DIR: &str = "data";
const RESOURCES_DIR: &str = "resources";
const TEMPLATES_DIR: &str = "templates";
const EXPORTS_DIR: &str = "exports";
const LOG_FILE: &str = "callsheet.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub root: PathBuf,
    /// One JSON file per call sheet.
    pub data_dir: PathBuf,
    /// Read-only templates.
    pub templates_dir: PathBuf,
    /// Default destination for exported PDFs.
    pub export_dir: PathBuf,
    pub log_file: PathBuf,
}

impl AppConfig {
    /// Resolve the root from `CALLSHEET_HOME`, falling back to
    /// `~/.callsheet-maker`.
    pub fn from_env() -> Result<Self> {
        match env::var_os(HOME_ENV).filter(|value| !value.is_empty()) {
            Some(root) => Ok(Self::with_root(PathBuf::from(root))),
            None => {
                let base_dirs =
                    BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
                Ok(Self::with_root(base_dirs.home_dir().join(APP_DIR_NAME)))
            }
        }
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            data_dir: root.join(DATA_DIR),
            templates_dir: root.join(RESOURCES_DIR).join(TEMPLATES_DIR),
            export_dir: root.join(EXPORTS_DIR),
            log_file: root.join(LOG_FILE),
            root,
        }
    }

    /// Create every directory the application writes to.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.data_dir, &self.templates_dir, &self.export_dir] {
            create_dir(dir)?;
        }
        Ok(())
    }

    /// Default export path for a call sheet identifier.
    pub fn export_path(&self, name: &str) -> PathBuf {
        self.export_dir.join(format!("{name}.pdf"))
    }
}

fn create_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn layout_hangs_off_the_root() {
        let config = AppConfig::with_root("/tmp/cs");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/cs/data"));
        assert_eq!(
            config.templates_dir,
            PathBuf::from("/tmp/cs/resources/templates")
        );
        assert_eq!(
            config.export_path("day-1"),
            PathBuf::from("/tmp/cs/exports/day-1.pdf")
        );
    }

    #[test]
    fn ensure_dirs_creates_the_tree() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::with_root(dir.path().join("app"));
        config.ensure_dirs().unwrap();
        assert!(config.data_dir.is_dir());
        assert!(config.templates_dir.is_dir());
        assert!(config.export_dir.is_dir());
    }
}
