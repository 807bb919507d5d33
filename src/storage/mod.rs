pub mod json_backend;

use std::path::{Path, PathBuf};

use crate::{core::ledger_manager::LedgerSnapshot, errors::LedgerError};

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Outcome of reading a ledger file, before it is installed into a [`LedgerManager`].
///
/// [`LedgerManager`]: crate::core::LedgerManager
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub snapshot: LedgerSnapshot,
    pub path: PathBuf,
    pub name: Option<String>,
    pub schema_version: u8,
}

/// Abstraction over persistence backends capable of storing ledgers and their backups.
pub trait StorageBackend: Send + Sync {
    fn save(&self, snapshot: &LedgerSnapshot, name: &str) -> Result<PathBuf>;
    fn load(&self, name: &str) -> Result<LoadReport>;
    fn list_backups(&self, name: &str) -> Result<Vec<String>>;
    fn backup(&self, snapshot: &LedgerSnapshot, name: &str, note: Option<&str>) -> Result<PathBuf>;
    fn restore(&self, name: &str, backup_name: &str) -> Result<LoadReport>;

    /// Ad-hoc file operations outside the managed ledger directory.
    fn save_to_path(&self, snapshot: &LedgerSnapshot, path: &Path) -> Result<()> {
        json_backend::save_snapshot_to_path(snapshot, path)
    }

    fn load_from_path(&self, path: &Path) -> Result<LoadReport> {
        json_backend::load_snapshot_from_path(path)
    }
}

pub use json_backend::{JsonStorage, LedgerDocument, CURRENT_SCHEMA_VERSION};
