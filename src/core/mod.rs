//! Orchestration over the ledger domain: the shared ledger, its observer hook, and path helpers.

pub mod ledger_manager;
pub mod notifier;
pub mod utils;

pub use ledger_manager::{LedgerManager, LedgerSnapshot};
pub use notifier::{ExpenseNotifier, NotifyError, TracingNotifier};
