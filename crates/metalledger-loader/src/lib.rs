//! Persistence for metalledger.
//!
//! This crate owns everything that touches the filesystem. The engine
//! crates only see an [`InventoryRepository`]; this crate reads it from and
//! writes it to a pretty-printed JSON document.
//!
//! # Features
//!
//! - Load with a one-time upgrade of older document shapes
//! - Full-overwrite save
//! - Timestamped backups with retention, plus a background auto-backup worker
//! - Validated JSON import and JSON/CSV export
//! - A small settings document
//!
//! # Example
//!
//! ```ignore
//! use metalledger_loader::Store;
//!
//! let store = Store::new("data.json", "backups");
//! let mut repo = store.load()?;
//! // ... book operations ...
//! store.save(&repo)?;
//! store.backup(&repo)?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod backup;
pub mod export;
mod legacy;
mod settings;

pub use backup::{AutoBackup, SharedInventory, BACKUP_PREFIX};
pub use legacy::UpgradeReport;
pub use settings::{Settings, MAX_BACKUP_INTERVAL_MINUTES};

use chrono::{Local, NaiveDateTime};
use metalledger_core::{EngineError, InventoryRepository};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Keys an import document must carry.
pub const REQUIRED_KEYS: [&str; 4] = ["metals", "history", "parties", "expenses"];

/// Errors that can occur while reading or writing files.
#[derive(Debug, Error)]
pub enum LoadError {
    /// IO error on a file or directory.
    #[error("failed to access {path}: {source}")]
    Io {
        /// The path involved.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// The file is not valid JSON or has the wrong shape.
    #[error("invalid JSON in {path}: {source}")]
    Json {
        /// The file that failed to parse.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// An import document lacks required top-level keys.
    #[error("{path} is not an inventory document: missing {}", .missing.join(", "))]
    InvalidDocument {
        /// The rejected file.
        path: PathBuf,
        /// Keys that were absent.
        missing: Vec<String>,
    },

    /// The document parsed but its contents are inconsistent.
    #[error("inconsistent data in {path}: {source}")]
    Inconsistent {
        /// The rejected file.
        path: PathBuf,
        /// The engine-level problem.
        #[source]
        source: EngineError,
    },

    /// CSV export failed.
    #[error("failed to write CSV {path}: {source}")]
    Csv {
        /// The output file.
        path: PathBuf,
        /// The underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// A settings value was rejected.
    #[error("invalid setting {key}: {value}")]
    InvalidSetting {
        /// Setting name.
        key: String,
        /// Rejected value.
        value: String,
    },
}

impl LoadError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn json(path: &Path, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Location of the data file and its backups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Store {
    data_path: PathBuf,
    backup_dir: PathBuf,
}

impl Store {
    /// Create a store.
    pub fn new(data_path: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            backup_dir: backup_dir.into(),
        }
    }

    /// Path of the data file.
    #[must_use]
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Directory holding backups.
    #[must_use]
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Load the data file. A missing file yields an empty repository.
    pub fn load(&self) -> Result<InventoryRepository, LoadError> {
        if !self.data_path.exists() {
            info!(path = %self.data_path.display(), "no data file, starting empty");
            return Ok(InventoryRepository::new());
        }
        read_document(&self.data_path)
    }

    /// Overwrite the data file with the whole repository.
    pub fn save(&self, repo: &InventoryRepository) -> Result<(), LoadError> {
        if let Some(parent) = self.data_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| LoadError::io(parent, e))?;
        }
        write_document(repo, &self.data_path)?;
        info!(path = %self.data_path.display(), "saved inventory");
        Ok(())
    }

    /// Write a timestamped backup of `repo`.
    pub fn backup(&self, repo: &InventoryRepository) -> Result<PathBuf, LoadError> {
        self.backup_at(repo, Local::now().naive_local())
    }

    /// Write a backup stamped with `now`.
    pub fn backup_at(
        &self,
        repo: &InventoryRepository,
        now: NaiveDateTime,
    ) -> Result<PathBuf, LoadError> {
        backup::write_backup(&self.backup_dir, repo, now)
    }

    /// Delete backups older than `retention_days`. Returns how many were removed.
    pub fn prune_backups(&self, retention_days: u64) -> Result<usize, LoadError> {
        backup::prune_backups(&self.backup_dir, retention_days, Local::now().naive_local())
    }

    /// List backup files, oldest first.
    pub fn backups(&self) -> Result<Vec<PathBuf>, LoadError> {
        backup::list_backups(&self.backup_dir).map(|list| list.into_iter().map(|(_, p)| p).collect())
    }
}

/// Read and upgrade a document from `path`.
///
/// Missing top-level keys and older metal shapes are filled in; see
/// [`UpgradeReport`].
pub fn read_document(path: &Path) -> Result<InventoryRepository, LoadError> {
    let text = fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
    let value: serde_json::Value =
        serde_json::from_str(&text).map_err(|e| LoadError::json(path, e))?;
    let (repo, report) = legacy::upgrade(value, Local::now().naive_local())
        .map_err(|e| match e {
            legacy::UpgradeError::Json(source) => LoadError::json(path, source),
            legacy::UpgradeError::Engine(source) => LoadError::Inconsistent {
                path: path.to_path_buf(),
                source,
            },
        })?;
    if !report.is_clean() {
        warn!(path = %path.display(), ?report, "upgraded older data layout");
    }
    Ok(repo)
}

/// Read a document for import, which replaces the whole repository.
///
/// Unlike [`read_document`], every key in [`REQUIRED_KEYS`] must be present.
pub fn import(path: &Path) -> Result<InventoryRepository, LoadError> {
    let text = fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
    let value: serde_json::Value =
        serde_json::from_str(&text).map_err(|e| LoadError::json(path, e))?;

    let missing: Vec<String> = REQUIRED_KEYS
        .iter()
        .filter(|key| value.get(**key).is_none())
        .map(|key| (*key).to_string())
        .collect();
    if !missing.is_empty() {
        return Err(LoadError::InvalidDocument {
            path: path.to_path_buf(),
            missing,
        });
    }

    let repo = read_document(path)?;
    info!(path = %path.display(), commodities = repo.commodities().len(), "imported inventory");
    Ok(repo)
}

/// Write the whole repository as pretty-printed JSON.
pub fn export_json(repo: &InventoryRepository, path: &Path) -> Result<(), LoadError> {
    write_document(repo, path)
}

fn write_document(repo: &InventoryRepository, path: &Path) -> Result<(), LoadError> {
    let text = serde_json::to_string_pretty(repo).map_err(|e| LoadError::json(path, e))?;
    fs::write(path, text).map_err(|e| LoadError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use metalledger_booking::{record_purchase, Purchase};
    use rust_decimal_macros::dec;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn stamp() -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2024, 4, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn sample() -> InventoryRepository {
        let mut repo = InventoryRepository::new();
        record_purchase(
            &mut repo,
            Purchase::new("Copper", dec!(100), dec!(10), "Acme", stamp()).with_payment(dec!(600), dec!(400)),
        )
        .unwrap();
        repo
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().join("data.json"), dir.path().join("backups"));
        assert_eq!(store.load().unwrap(), InventoryRepository::new());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().join("nested/data.json"), dir.path().join("backups"));
        let repo = sample();

        store.save(&repo).unwrap();
        let text = fs::read_to_string(store.data_path()).unwrap();
        assert!(text.contains("\n  \"metals\""));

        assert_eq!(store.load().unwrap(), repo);
    }

    #[test]
    fn test_load_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{ not json").unwrap();
        let err = read_document(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::Json { .. }));
    }

    #[test]
    fn test_import_requires_all_keys() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"metals": [], "history": []}}"#).unwrap();
        let err = import(file.path()).unwrap_err();
        match err {
            LoadError::InvalidDocument { missing, .. } => {
                assert_eq!(missing, vec!["parties".to_string(), "expenses".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_export_then_import() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("export.json");
        let repo = sample();
        export_json(&repo, &path).unwrap();
        assert_eq!(import(&path).unwrap(), repo);
    }

    #[test]
    fn test_backup_at_names_file() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().join("data.json"), dir.path().join("backups"));
        let path = store.backup_at(&sample(), stamp()).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "backup_20240401_120000.json"
        );
        assert_eq!(store.backups().unwrap(), vec![path]);
    }
}
