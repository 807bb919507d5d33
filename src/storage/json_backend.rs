use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    fs,
    path::{Component, Path, PathBuf},
};
use tracing::{debug, info};

use crate::{
    core::{
        ledger_manager::LedgerSnapshot,
        utils::{ensure_dir, write_atomic, PathResolver},
    },
    errors::LedgerError,
    ledger::{BalanceMap, Expense, ExpenseRecord, Group, User},
};

use super::{LoadReport, Result, StorageBackend};

const LEDGER_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const DEFAULT_RETENTION: usize = 5;
const REQUIRED_ARRAYS: [&str; 3] = ["users", "groups", "expenses"];

pub const CURRENT_SCHEMA_VERSION: u8 = 1;

/// Serialized ledger: users, groups, the expense history, and the balance map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerDocument {
    #[serde(default = "LedgerDocument::schema_version_default")]
    pub schema_version: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
    pub users: Vec<User>,
    pub groups: Vec<Group>,
    pub expenses: Vec<ExpenseRecord>,
    #[serde(default)]
    pub balances: BalanceMap,
}

impl LedgerDocument {
    pub fn schema_version_default() -> u8 {
        CURRENT_SCHEMA_VERSION
    }

    pub fn from_snapshot(snapshot: &LedgerSnapshot) -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            saved_at: Some(Utc::now()),
            users: snapshot.users.clone(),
            groups: snapshot.groups.clone(),
            expenses: snapshot.expenses.iter().map(Expense::to_record).collect(),
            balances: snapshot.balances.clone(),
        }
    }

    /// Resolves every strategy tag; an unknown tag fails with the factory's own error.
    pub fn into_snapshot(self) -> Result<LedgerSnapshot> {
        let expenses = self
            .expenses
            .into_iter()
            .map(Expense::from_record)
            .collect::<Result<Vec<_>>>()?;
        Ok(LedgerSnapshot {
            users: self.users,
            groups: self.groups,
            expenses,
            balances: self.balances,
        })
    }

    /// Parses a document, checking the root shape before decoding it.
    pub fn parse(data: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(data)?;
        let root = value.as_object().ok_or_else(|| {
            LedgerError::Persistence("Invalid JSON format: expected an object at the root".into())
        })?;
        for key in REQUIRED_ARRAYS {
            match root.get(key) {
                None => {
                    return Err(LedgerError::Persistence(format!(
                        "Invalid JSON: missing key '{key}'"
                    )))
                }
                Some(entry) if !entry.is_array() => {
                    return Err(LedgerError::Persistence(format!(
                        "Invalid JSON format: '{key}' must be an array"
                    )))
                }
                Some(_) => {}
            }
        }
        let document: LedgerDocument = serde_json::from_value(value)?;
        if document.schema_version > CURRENT_SCHEMA_VERSION {
            return Err(LedgerError::Persistence(format!(
                "ledger schema v{} is newer than supported v{}",
                document.schema_version, CURRENT_SCHEMA_VERSION
            )));
        }
        Ok(document)
    }
}

#[derive(Clone)]
pub struct JsonStorage {
    ledgers_dir: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
}

impl JsonStorage {
    pub fn new(root: Option<PathBuf>, retention: Option<usize>) -> Result<Self> {
        let app_root = PathResolver::resolve_base(root);
        ensure_dir(&app_root)?;
        let ledgers_dir = PathResolver::ledger_dir_in(&app_root);
        let backups_dir = PathResolver::backup_dir_in(&app_root);
        ensure_dir(&ledgers_dir)?;
        ensure_dir(&backups_dir)?;
        Ok(Self {
            ledgers_dir,
            backups_dir,
            retention: retention.unwrap_or(DEFAULT_RETENTION).max(1),
        })
    }

    pub fn new_default() -> Result<Self> {
        Self::new(None, None)
    }

    pub fn ledger_path(&self, name: &str) -> PathBuf {
        self.ledgers_dir
            .join(format!("{}.{}", canonical_name(name), LEDGER_EXTENSION))
    }

    fn backup_dir(&self, name: &str) -> PathBuf {
        self.backups_dir.join(canonical_name(name))
    }

    /// Path of `backup_name` inside the ledger's backup directory.
    ///
    /// Only a bare file name is accepted; separators and `..` are rejected.
    pub fn backup_path(&self, name: &str, backup_name: &str) -> Result<PathBuf> {
        let mut components = Path::new(backup_name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(file)), None)
                if !backup_name.contains(['/', '\\']) && file == backup_name =>
            {
                Ok(self.backup_dir(name).join(file))
            }
            _ => Err(LedgerError::Validation(format!(
                "invalid backup name `{backup_name}`"
            ))),
        }
    }

    fn backup_file_name(&self, name: &str, note: Option<&str>) -> String {
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let mut stem = format!("{}_{}", canonical_name(name), timestamp);
        if let Some(label) = sanitize_backup_note(note) {
            stem.push('_');
            stem.push_str(&label);
        }
        format!("{stem}.{LEDGER_EXTENSION}")
    }

    fn backup_existing_file(&self, name: &str, path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }
        let dir = self.backup_dir(name);
        ensure_dir(&dir)?;
        let backup_path = dir.join(self.backup_file_name(name, None));
        fs::copy(path, &backup_path)?;
        debug!(backup = %backup_path.display(), "previous ledger file backed up");
        self.prune_backups(name)
    }

    fn prune_backups(&self, name: &str) -> Result<()> {
        let backups = self.list_backups(name)?;
        for entry in backups.iter().skip(self.retention) {
            if let Ok(path) = self.backup_path(name, entry) {
                let _ = fs::remove_file(path);
            }
        }
        Ok(())
    }
}

impl StorageBackend for JsonStorage {
    fn save(&self, snapshot: &LedgerSnapshot, name: &str) -> Result<PathBuf> {
        let path = self.ledger_path(name);
        self.backup_existing_file(name, &path)?;
        save_snapshot_to_path(snapshot, &path)?;
        Ok(path)
    }

    fn load(&self, name: &str) -> Result<LoadReport> {
        let path = self.ledger_path(name);
        if !path.exists() {
            return Err(LedgerError::Persistence(format!("ledger `{name}` not found")));
        }
        let mut report = load_snapshot_from_path(&path)?;
        report.name = Some(canonical_name(name));
        Ok(report)
    }

    fn list_backups(&self, name: &str) -> Result<Vec<String>> {
        let dir = self.backup_dir(name);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(LEDGER_EXTENSION) {
                continue;
            }
            if let Some(file_name) = path.file_name().and_then(|name| name.to_str()) {
                entries.push(file_name.to_string());
            }
        }
        entries.sort_by(|a, b| {
            parse_backup_timestamp(b)
                .cmp(&parse_backup_timestamp(a))
                .then_with(|| b.cmp(a))
        });
        Ok(entries)
    }

    fn backup(&self, snapshot: &LedgerSnapshot, name: &str, note: Option<&str>) -> Result<PathBuf> {
        let dir = self.backup_dir(name);
        ensure_dir(&dir)?;
        let path = dir.join(self.backup_file_name(name, note));
        save_snapshot_to_path(snapshot, &path)?;
        self.prune_backups(name)?;
        Ok(path)
    }

    fn restore(&self, name: &str, backup_name: &str) -> Result<LoadReport> {
        let backup_path = self.backup_path(name, backup_name)?;
        if !backup_path.exists() {
            return Err(LedgerError::Persistence(format!(
                "backup `{backup_name}` not found"
            )));
        }
        // Parse first so a corrupt backup never replaces the live file.
        let mut report = load_snapshot_from_path(&backup_path)?;
        let target = self.ledger_path(name);
        fs::copy(&backup_path, &target)?;
        report.path = target;
        report.name = Some(canonical_name(name));
        Ok(report)
    }
}

pub fn save_snapshot_to_path(snapshot: &LedgerSnapshot, path: &Path) -> Result<()> {
    let document = LedgerDocument::from_snapshot(snapshot);
    let json = serde_json::to_string_pretty(&document)?;
    write_atomic(path, &json)?;
    info!(path = %path.display(), expenses = document.expenses.len(), "ledger saved");
    Ok(())
}

pub fn load_snapshot_from_path(path: &Path) -> Result<LoadReport> {
    let data = fs::read_to_string(path)?;
    let document = LedgerDocument::parse(&data)?;
    let schema_version = document.schema_version;
    let snapshot = document.into_snapshot()?;
    info!(path = %path.display(), expenses = snapshot.expenses.len(), "ledger loaded");
    Ok(LoadReport {
        snapshot,
        path: path.to_path_buf(),
        name: None,
        schema_version,
    })
}

fn canonical_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' => c,
            _ => '_',
        })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        "ledger".into()
    } else {
        sanitized
    }
}

fn sanitize_backup_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    let mut sanitized = String::new();
    let mut last_dash = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if (ch.is_whitespace() || matches!(ch, '-' | '.')) && !sanitized.is_empty() && !last_dash {
            sanitized.push('-');
            last_dash = true;
        }
    }
    let trimmed = sanitized.trim_matches('-');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_backup_timestamp(file_name: &str) -> Option<DateTime<Utc>> {
    let stem = file_name.strip_suffix(&format!(".{LEDGER_EXTENSION}"))?;
    let parts: Vec<&str> = stem.split('_').collect();
    // Scan from the end: canonical names may contain '_' but sanitized notes never do.
    parts.windows(2).rev().find_map(|pair| {
        let (date, time) = (pair[0], pair[1]);
        if is_digits(date, 8) && is_digits(time, 6) {
            NaiveDateTime::parse_from_str(&format!("{date}{time}"), "%Y%m%d%H%M%S")
                .ok()
                .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
        } else {
            None
        }
    })
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}
