use serde::{Deserialize, Serialize};

use super::split::BalanceMap;

/// Residue below this magnitude is snapped to exactly zero after accumulation.
pub const ZERO_SNAP_TOLERANCE: f64 = 1e-9;

/// Running net balance per user. Serializes as a flat `{ user: amount }` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BalanceSheet {
    balances: BalanceMap,
}

impl BalanceSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulates every entry of `delta`. Users are never removed, even when they settle at zero.
    pub fn apply_delta(&mut self, delta: &BalanceMap) {
        for (user_id, change) in delta {
            let balance = self.balances.entry(user_id.clone()).or_insert(0.0);
            *balance += change;
            if balance.abs() < ZERO_SNAP_TOLERANCE {
                *balance = 0.0;
            }
        }
    }

    pub fn clear(&mut self) {
        self.balances.clear();
    }

    pub fn balances(&self) -> &BalanceMap {
        &self.balances
    }

    pub fn balance(&self, user_id: &str) -> Option<f64> {
        self.balances.get(user_id).copied()
    }

    pub fn total(&self) -> f64 {
        self.balances.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}

impl From<BalanceMap> for BalanceSheet {
    fn from(balances: BalanceMap) -> Self {
        Self { balances }
    }
}
