use std::path::PathBuf;

use crate::{
    config::{Config, ConfigManager},
    core::LedgerManager,
    storage::JsonStorage,
};

use super::commands::CommandRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub ledger: LedgerManager,
    pub storage: JsonStorage,
    pub config_manager: ConfigManager,
    pub config: Config,
    /// Name of the managed ledger file the session is bound to, if any.
    pub ledger_name: Option<String>,
    /// Explicit file the session was loaded from or saved to with `save <path>`.
    pub ledger_path: Option<PathBuf>,
    pub last_command: Option<String>,
    pub running: bool,
}

impl ShellContext {
    /// Ledger name used by `save`, `backup` and friends when none is given.
    pub fn active_ledger_name(&self) -> String {
        self.ledger_name
            .clone()
            .unwrap_or_else(|| self.config.active_ledger().to_string())
    }
}
