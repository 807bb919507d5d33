#![doc(test(attr(deny(warnings))))]

//! Split Core keeps a shared-expense ledger: it splits expenses between group members,
//! tracks who owes whom, and proposes payments that settle every balance.

pub mod cli;
pub mod config;
pub mod core;
pub mod errors;
pub mod ledger;
pub mod storage;
pub mod utils;

use std::sync::Once;

pub use crate::core::{ExpenseNotifier, LedgerManager, LedgerSnapshot};
pub use errors::{ErrorKind, LedgerError};

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Split Core tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
        super::init();
    }
}
