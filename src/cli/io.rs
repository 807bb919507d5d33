use std::fmt;

use dialoguer::{theme::ColorfulTheme, Confirm};

use crate::cli::core::CommandError;
use crate::cli::output;
use crate::core::{ExpenseNotifier, NotifyError};
use crate::ledger::Expense;

pub fn print_info(message: impl fmt::Display) {
    output::info(message);
}

pub fn print_warning(message: impl fmt::Display) {
    output::warning(message);
}

pub fn print_error(message: impl fmt::Display) {
    output::error(message);
}

pub fn print_success(message: impl fmt::Display) {
    output::success(message);
}

pub fn print_hint(message: impl fmt::Display) {
    output::hint(message);
}

/// Prompt the user for confirmation with a yes/no question.
pub fn confirm_action(prompt: &str, default: bool) -> Result<bool, CommandError> {
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(default)
        .interact()
        .map_err(CommandError::from)
}

/// Prints large-expense alerts to the console.
pub struct ConsoleNotifier {
    currency: String,
}

impl ConsoleNotifier {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
        }
    }
}

impl ExpenseNotifier for ConsoleNotifier {
    fn notify_large_expense(&self, expense: &Expense, threshold: f64) -> Result<(), NotifyError> {
        print_warning(format!(
            "[Alert] Expense {} `{}` of {} exceeds threshold {}",
            expense.id,
            expense.description,
            output::format_amount(expense.amount(), &self.currency),
            output::format_amount(threshold, &self.currency),
        ));
        Ok(())
    }
}
