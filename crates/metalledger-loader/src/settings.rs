//! The settings document.

use metalledger_core::ProfitBase;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::LoadError;

/// User settings, stored next to the data file.
///
/// Every field has a default, so older or partial documents load cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Write a backup after every save and periodically in the shell.
    pub auto_backup: bool,
    /// Minutes between periodic backups.
    pub backup_interval_minutes: u64,
    /// Backups older than this many days are deleted.
    pub backup_retention_days: u64,
    /// Denominator for profit percentages.
    pub profit_base: ProfitBase,
    /// Dark theme for front-ends that have one.
    pub dark_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_backup: true,
            backup_interval_minutes: 30,
            backup_retention_days: 7,
            profit_base: ProfitBase::Cost,
            dark_mode: false,
        }
    }
}

/// Longest accepted backup interval: one week.
pub const MAX_BACKUP_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

impl Settings {
    /// Names accepted by [`set`](Self::set).
    pub const KEYS: [&'static str; 5] = [
        "auto_backup",
        "backup_interval_minutes",
        "backup_retention_days",
        "profit_base",
        "dark_mode",
    ];

    /// Load settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
        let settings: Self = serde_json::from_str(&text).map_err(|e| LoadError::json(path, e))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Write settings to `path`.
    pub fn save(&self, path: &Path) -> Result<(), LoadError> {
        let text = serde_json::to_string_pretty(self).map_err(|e| LoadError::json(path, e))?;
        fs::write(path, text).map_err(|e| LoadError::io(path, e))
    }

    /// Set one setting from its textual form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), LoadError> {
        let invalid = || LoadError::InvalidSetting {
            key: key.to_string(),
            value: value.to_string(),
        };
        let mut next = self.clone();
        match key {
            "auto_backup" => next.auto_backup = value.parse().map_err(|_| invalid())?,
            "backup_interval_minutes" => {
                next.backup_interval_minutes = value.parse().map_err(|_| invalid())?;
            }
            "backup_retention_days" => {
                next.backup_retention_days = value.parse().map_err(|_| invalid())?;
            }
            "profit_base" => next.profit_base = value.parse().map_err(|_| invalid())?,
            "dark_mode" => next.dark_mode = value.parse().map_err(|_| invalid())?,
            _ => return Err(invalid()),
        }
        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Interval between periodic backups.
    #[must_use]
    pub fn backup_interval(&self) -> Duration {
        Duration::from_secs(self.backup_interval_minutes.saturating_mul(60))
    }

    fn validate(&self) -> Result<(), LoadError> {
        if !(1..=MAX_BACKUP_INTERVAL_MINUTES).contains(&self.backup_interval_minutes) {
            return Err(LoadError::InvalidSetting {
                key: "backup_interval_minutes".to_string(),
                value: self.backup_interval_minutes.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load(&dir.path().join("settings.json")).unwrap();
        assert!(settings.auto_backup);
        assert_eq!(settings.backup_interval(), Duration::from_secs(1800));
        assert_eq!(settings.backup_retention_days, 7);
        assert_eq!(settings.profit_base, ProfitBase::Cost);
    }

    #[test]
    fn test_partial_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"dark_mode": true, "auto_backup": false}"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert!(settings.dark_mode);
        assert!(!settings.auto_backup);
        assert_eq!(settings.backup_interval_minutes, 30);
    }

    #[test]
    fn test_set_and_save() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let mut settings = Settings::default();
        settings.set("profit_base", "revenue").unwrap();
        settings.set("backup_retention_days", "14").unwrap();
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded.profit_base, ProfitBase::Revenue);
        assert_eq!(loaded.backup_retention_days, 14);
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut settings = Settings::default();
        assert!(settings.set("auto_backup", "maybe").is_err());
        assert!(settings.set("colour", "blue").is_err());
        assert!(settings.set("backup_interval_minutes", "0").is_err());
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_backup_interval_is_bounded() {
        let mut settings = Settings::default();
        let err = settings
            .set("backup_interval_minutes", "18446744073709551615")
            .unwrap_err();
        assert!(matches!(err, LoadError::InvalidSetting { .. }));
        assert_eq!(settings.backup_interval(), Duration::from_secs(1800));

        settings.set("backup_interval_minutes", "10080").unwrap();
        assert_eq!(settings.backup_interval(), Duration::from_secs(604_800));
    }

    #[test]
    fn test_load_rejects_huge_interval() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"backup_interval_minutes": 18446744073709551615}"#).unwrap();
        assert!(matches!(
            Settings::load(&path),
            Err(LoadError::InvalidSetting { .. })
        ));
    }
}
