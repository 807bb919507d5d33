//! Core CLI loop, dispatch, and shell context helpers.

use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use rustyline::error::ReadlineError;
use strsim::levenshtein;
use tracing::debug;

use crate::{
    config::ConfigManager,
    core::{utils::PathResolver, LedgerManager},
    errors::LedgerError,
    storage::{JsonStorage, LoadReport, StorageBackend},
};

use super::commands::{self, CommandDefinition, CommandRegistry};
use super::io as cli_io;
pub use super::shell_context::{CliMode, ShellContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        Self::with_base_dir(mode, PathResolver::base_dir())
    }

    pub fn with_base_dir(mode: CliMode, base: PathBuf) -> Result<Self, CliError> {
        let config_manager = ConfigManager::with_base_dir(base.clone())?;
        let config = config_manager.load()?;
        let storage = JsonStorage::new(Some(base), Some(config.backup_retention))?;

        let ledger = LedgerManager::new();
        ledger.set_notifier(Some(Arc::new(cli_io::ConsoleNotifier::new(
            config.currency.clone(),
        ))));
        ledger.set_notification_threshold(config.notification_threshold)?;

        let mut context = Self {
            mode,
            registry: CommandRegistry::new(commands::all_definitions()),
            ledger,
            storage,
            config_manager,
            config,
            ledger_name: None,
            ledger_path: None,
            last_command: None,
            running: true,
        };
        context.auto_load_last();
        Ok(context)
    }

    fn auto_load_last(&mut self) {
        if self.mode != CliMode::Interactive {
            return;
        }
        let Some(name) = self.config.last_opened_ledger.clone() else {
            return;
        };
        match self.storage.load(&name) {
            Ok(report) => match self.install(report) {
                Ok(()) => cli_io::print_success(format!("Automatically loaded ledger `{name}`.")),
                Err(err) => self.report_error(err),
            },
            Err(err) => debug!(ledger = %name, error = %err, "last ledger not loaded"),
        }
    }

    /// Restores a loaded snapshot into the ledger and binds the session to its source.
    pub(crate) fn install(&mut self, report: LoadReport) -> CommandResult {
        let LoadReport {
            snapshot,
            path,
            name,
            schema_version,
        } = report;
        let warnings = self.ledger.restore(snapshot)?;
        for warning in &warnings {
            cli_io::print_warning(warning);
        }
        debug!(path = %path.display(), schema_version, "ledger installed");
        match name {
            Some(name) => {
                self.ledger_name = Some(name);
                self.ledger_path = None;
            }
            None => self.ledger_path = Some(path),
        }
        Ok(())
    }

    pub(crate) fn persist_config(&self) -> CommandResult {
        self.config_manager.save(&self.config)?;
        Ok(())
    }

    pub(crate) fn update_last_opened(&mut self, name: &str) -> CommandResult {
        if self.config.last_opened_ledger.as_deref() == Some(name) {
            return Ok(());
        }
        self.config.last_opened_ledger = Some(name.to_string());
        self.persist_config()
    }

    pub(crate) fn currency(&self) -> &str {
        &self.config.currency
    }

    /// Display label for a user id, falling back to the bare id.
    pub(crate) fn user_label(&self, id: &str) -> String {
        match self.ledger.user(id) {
            Some(user) => format!("{} ({})", user.name, user.id),
            None => id.to_string(),
        }
    }

    pub(crate) fn ledger_source(&self) -> String {
        match &self.ledger_path {
            Some(path) => path.display().to_string(),
            None => self.active_ledger_name(),
        }
    }

    pub(crate) fn prompt(&self) -> String {
        let marker = if self.ledger.is_dirty() { "*" } else { "" };
        format!("split[{}{}]> ", self.ledger_source(), marker)
    }

    pub(crate) fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandDefinition> {
        self.registry.get(name)
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.get(command).map(|entry| entry.handler) {
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    pub(crate) fn process_line(&mut self, line: &str) -> Result<LoopControl, CommandError> {
        let tokens = match crate::cli::shell::parse_command_line(line) {
            Ok(tokens) => tokens,
            Err(err) => {
                self.print_warning(&err.to_string());
                return Ok(LoopControl::Continue);
            }
        };

        let Some(raw) = tokens.first() else {
            return Ok(LoopControl::Continue);
        };
        let command = raw.to_lowercase();
        let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();

        self.last_command = Some(line.trim().to_string());
        match self.dispatch(&command, raw, &args) {
            Ok(LoopControl::Exit) => {
                self.running = false;
                Ok(LoopControl::Exit)
            }
            other => other,
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        cli_io::print_warning(format!(
            "Unknown command `{input}`. Type `help` to see available commands."
        ));

        let needle = input.to_lowercase();
        let best = self
            .registry
            .names()
            .map(|key| (levenshtein(key, &needle), key))
            .min_by_key(|(distance, _)| *distance);

        if let Some((distance, best)) = best {
            if distance <= 3 {
                cli_io::print_hint(format!("Did you mean `{best}`?"));
            }
        }
    }

    /// Asks before dropping unsaved changes. Script sessions never prompt.
    pub(crate) fn confirm_discard(&self, prompt: &str) -> Result<bool, CommandError> {
        if self.mode == CliMode::Script || !self.ledger.is_dirty() {
            return Ok(true);
        }
        cli_io::confirm_action(prompt, false)
    }

    pub(crate) fn report_error(&self, err: CommandError) {
        match err {
            CommandError::ExitRequested => {}
            CommandError::InvalidArguments(message) => {
                self.print_error(&message);
                cli_io::print_hint("Use `help <command>` for usage details.");
            }
            CommandError::Core(err) => {
                self.print_error(&format!("{err} [{}]", err.kind().label()));
            }
            other => self.print_error(&other.to_string()),
        }
    }

    pub(crate) fn print_error(&self, message: &str) {
        cli_io::print_error(message);
    }

    pub(crate) fn print_warning(&self, message: &str) {
        cli_io::print_warning(message);
    }
}

/// Treats arguments with a path separator or a `.json` suffix as file paths rather than ledger names.
pub(crate) fn looks_like_path(target: &str) -> bool {
    target.contains(std::path::MAIN_SEPARATOR)
        || target.contains('/')
        || Path::new(target)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] LedgerError),
    #[error("Invalid input: {0}")]
    Input(String),
    #[error("Command failed: {0}")]
    Command(String),
    #[error(transparent)]
    Readline(#[from] ReadlineError),
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Core(#[from] LedgerError),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Core(inner) => CliError::Core(inner),
            CommandError::InvalidArguments(message) => CliError::Input(message),
            other => CliError::Command(other.to_string()),
        }
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        CliError::Command(err.to_string())
    }
}

#[cfg(test)]
pub(crate) fn process_script(base: &Path, lines: &[&str]) -> Result<ShellContext, CliError> {
    let mut app = ShellContext::with_base_dir(CliMode::Script, base.to_path_buf())?;
    for line in lines {
        match app.process_line(line) {
            Ok(LoopControl::Continue) => {}
            Ok(LoopControl::Exit) => break,
            Err(err) => app.report_error(err),
        }
    }
    Ok(app)
}
