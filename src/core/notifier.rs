//! Observer hook fired after an expense above the configured threshold is recorded.

use tracing::warn;

use crate::ledger::Expense;

#[derive(Debug, thiserror::Error)]
#[error("notifier failed: {0}")]
pub struct NotifyError(pub String);

/// Receives large-expense alerts. Failures are logged by the caller and never roll back the expense.
pub trait ExpenseNotifier: Send + Sync {
    fn notify_large_expense(&self, expense: &Expense, threshold: f64) -> Result<(), NotifyError>;
}

/// Emits large-expense alerts as `tracing` warnings.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl ExpenseNotifier for TracingNotifier {
    fn notify_large_expense(&self, expense: &Expense, threshold: f64) -> Result<(), NotifyError> {
        warn!(
            expense_id = %expense.id,
            amount = expense.amount(),
            threshold,
            "expense `{}` exceeded threshold",
            expense.description
        );
        Ok(())
    }
}
