#![allow(dead_code)]

use std::{path::PathBuf, sync::Mutex};

use once_cell::sync::Lazy;
use split_core::{
    config::ConfigManager,
    ledger::{SplitInput, SplitStrategy},
    storage::JsonStorage,
    LedgerManager,
};
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Creates a unique data directory that outlives the calling test.
pub fn temp_base() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// Creates isolated storage and config managers backed by a unique directory.
pub fn setup_test_env() -> (LedgerManager, JsonStorage, ConfigManager) {
    let base = temp_base();
    let storage = JsonStorage::new(Some(base.clone()), Some(3)).expect("create json storage");
    let config_manager = ConfigManager::with_base_dir(base).expect("create config manager");
    (LedgerManager::new(), storage, config_manager)
}

/// Three users A, B, C in one group, returned as (group id, [user ids]).
pub fn trip_ledger(manager: &LedgerManager) -> (String, [String; 3]) {
    let a = manager.add_user("Alice").expect("add Alice");
    let b = manager.add_user("Bob").expect("add Bob");
    let c = manager.add_user("Carol").expect("add Carol");
    let group = manager
        .add_group("Trip", &[a.clone(), b.clone(), c.clone()])
        .expect("add group");
    (group, [a, b, c])
}

/// Records the three-expense reference scenario: A=+62, B=-18, C=-44.
pub fn record_reference_scenario(manager: &LedgerManager, group: &str, users: &[String; 3]) {
    let [a, b, c] = users;
    manager
        .record_expense(
            group,
            "Dinner",
            SplitInput::new(a.as_str(), 120.0, [a, b, c]),
            SplitStrategy::Equal,
        )
        .expect("equal expense");
    manager
        .record_expense(
            group,
            "Hotel",
            SplitInput::new(b.as_str(), 60.0, [a, b, c]).with_percent_shares(vec![30.0, 30.0, 40.0]),
            SplitStrategy::Percent,
        )
        .expect("percent expense");
    manager
        .record_expense(
            group,
            "Taxi",
            SplitInput::new(c.as_str(), 45.0, [b, c]).with_exact_shares(vec![20.0, 25.0]),
            SplitStrategy::Exact,
        )
        .expect("exact expense");
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
