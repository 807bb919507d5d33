//! Ledger domain models: split strategies, balances, settlement, and expense records.

pub mod balance_sheet;
pub mod expense;
pub mod group;
pub mod ids;
pub mod settlement;
pub mod split;
pub mod user;

pub use balance_sheet::{BalanceSheet, ZERO_SNAP_TOLERANCE};
pub use expense::{Expense, ExpenseRecord};
pub use group::Group;
pub use ids::IdCounters;
pub use settlement::{settle, SettlementTransaction, SETTLEMENT_EPSILON};
pub use split::{BalanceMap, SplitInput, SplitStrategy, SHARE_TOLERANCE};
pub use user::User;
