use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    core::utils::{ensure_dir, write_atomic, PathResolver},
    errors::LedgerError,
};

const DEFAULT_RETENTION: usize = 5;

/// User preferences persisted alongside the ledgers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub currency: String,
    /// Expenses strictly above this amount trigger the large-expense notifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_threshold: Option<f64>,
    #[serde(default = "Config::default_backup_retention")]
    pub backup_retention: usize,
    #[serde(default = "Config::default_ledger_name")]
    pub default_ledger: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_opened_ledger: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            currency: "USD".into(),
            notification_threshold: None,
            backup_retention: Self::default_backup_retention(),
            default_ledger: Self::default_ledger_name(),
            last_opened_ledger: None,
        }
    }
}

impl Config {
    pub fn default_backup_retention() -> usize {
        DEFAULT_RETENTION
    }

    pub fn default_ledger_name() -> String {
        "ledger".into()
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        if let Some(threshold) = self.notification_threshold {
            if threshold.is_nan() || threshold < 0.0 {
                return Err(LedgerError::Validation(format!(
                    "notification threshold must be a non-negative number, got {threshold}"
                )));
            }
        }
        if self.currency.trim().is_empty() {
            return Err(LedgerError::validation("currency code cannot be empty"));
        }
        Ok(())
    }

    /// Name of the ledger to open when none is given explicitly.
    pub fn active_ledger(&self) -> &str {
        self.last_opened_ledger
            .as_deref()
            .unwrap_or(&self.default_ledger)
    }
}

pub struct ConfigManager {
    base: PathBuf,
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self, LedgerError> {
        Self::with_base_dir(PathResolver::base_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, LedgerError> {
        ensure_dir(&base)?;
        ensure_dir(&PathResolver::config_dir_in(&base))?;
        Ok(Self {
            path: PathResolver::config_file_in(&base),
            base,
        })
    }

    /// Reads the stored config, falling back to defaults when none has been saved yet.
    pub fn load(&self) -> Result<Config, LedgerError> {
        if !self.path.exists() {
            return Ok(Config::default());
        }
        let data = fs::read_to_string(&self.path)?;
        let config: Config = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<(), LedgerError> {
        config.validate()?;
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, &json)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn base_dir(&self) -> &Path {
        &self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let temp = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        assert_eq!(manager.load().unwrap(), Config::default());
    }

    #[test]
    fn save_and_reload_roundtrip() {
        let temp = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        let config = Config {
            currency: "EUR".into(),
            notification_threshold: Some(250.0),
            last_opened_ledger: Some("trip".into()),
            ..Config::default()
        };
        manager.save(&config).unwrap();
        assert!(manager.path().exists());
        assert_eq!(manager.load().unwrap(), config);
        assert_eq!(config.active_ledger(), "trip");
    }

    #[test]
    fn rejects_negative_threshold() {
        let config = Config {
            notification_threshold: Some(-10.0),
            ..Config::default()
        };
        assert_eq!(config.validate().unwrap_err().kind(), ErrorKind::Validation);
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let temp = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        fs::write(manager.path(), r#"{"currency":"GBP"}"#).unwrap();
        let config = manager.load().unwrap();
        assert_eq!(config.currency, "GBP");
        assert_eq!(config.backup_retention, DEFAULT_RETENTION);
        assert_eq!(config.active_ledger(), "ledger");
    }
}
