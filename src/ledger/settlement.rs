//! Greedy settlement of a balance snapshot into pairwise transfers.
//!
//! The largest outstanding creditor is always matched with the largest outstanding
//! debtor, and the smaller of the two magnitudes is transferred. This keeps the
//! transfer count low in practice but is not guaranteed to reach the minimum number
//! of transfers; that problem is NP-hard and out of reach for a greedy pass.
//!
//! Ties are broken by the order in which users appear in the snapshot (ascending user
//! id for a [`BalanceMap`]), so a fixed input always yields the same transfer list.

use std::{cmp::Ordering, collections::BinaryHeap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::split::BalanceMap;

/// Balances within this distance of zero are treated as settled.
pub const SETTLEMENT_EPSILON: f64 = 1e-6;

/// One proposed payment from a debtor to a creditor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementTransaction {
    pub from_user_id: String,
    pub to_user_id: String,
    pub amount: f64,
}

#[derive(Debug)]
struct Outstanding {
    user_id: String,
    magnitude: f64,
    position: usize,
}

impl PartialEq for Outstanding {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Outstanding {}

impl PartialOrd for Outstanding {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Outstanding {
    // Larger magnitude first; on equal magnitude the earlier position wins.
    fn cmp(&self, other: &Self) -> Ordering {
        self.magnitude
            .total_cmp(&other.magnitude)
            .then_with(|| other.position.cmp(&self.position))
    }
}

/// Produces transfers that discharge every balance beyond [`SETTLEMENT_EPSILON`].
pub fn settle(balances: &BalanceMap) -> Vec<SettlementTransaction> {
    let mut creditors = BinaryHeap::new();
    let mut debtors = BinaryHeap::new();
    for (position, (user_id, balance)) in balances.iter().enumerate() {
        if *balance > SETTLEMENT_EPSILON {
            creditors.push(Outstanding {
                user_id: user_id.clone(),
                magnitude: *balance,
                position,
            });
        } else if *balance < -SETTLEMENT_EPSILON {
            debtors.push(Outstanding {
                user_id: user_id.clone(),
                magnitude: -*balance,
                position,
            });
        }
    }

    let mut transfers = Vec::new();
    // Stops as soon as either side runs dry; the zero-sum invariant leaves only sub-epsilon residue.
    while let (Some(mut creditor), Some(mut debtor)) = (creditors.pop(), debtors.pop()) {
        let amount = creditor.magnitude.min(debtor.magnitude);
        creditor.magnitude -= amount;
        debtor.magnitude -= amount;
        transfers.push(SettlementTransaction {
            from_user_id: debtor.user_id.clone(),
            to_user_id: creditor.user_id.clone(),
            amount,
        });

        if creditor.magnitude > SETTLEMENT_EPSILON {
            creditors.push(creditor);
        }
        if debtor.magnitude > SETTLEMENT_EPSILON {
            debtors.push(debtor);
        }
    }

    debug!(transfers = transfers.len(), "settlement computed");
    transfers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balances(entries: &[(&str, f64)]) -> BalanceMap {
        entries
            .iter()
            .map(|(user, amount)| (user.to_string(), *amount))
            .collect()
    }

    fn transfer(from: &str, to: &str, amount: f64) -> SettlementTransaction {
        SettlementTransaction {
            from_user_id: from.into(),
            to_user_id: to.into(),
            amount,
        }
    }

    #[test]
    fn single_creditor_collects_from_largest_debtor_first() {
        let result = settle(&balances(&[("A", 62.0), ("B", -18.0), ("C", -44.0)]));
        assert_eq!(result, vec![transfer("C", "A", 44.0), transfer("B", "A", 18.0)]);
    }

    #[test]
    fn equal_magnitudes_break_ties_by_snapshot_order() {
        let result = settle(&balances(&[("A", 10.0), ("B", 10.0), ("C", -10.0), ("D", -10.0)]));
        assert_eq!(result, vec![transfer("C", "A", 10.0), transfer("D", "B", 10.0)]);
    }

    #[test]
    fn near_zero_balances_are_ignored() {
        let result = settle(&balances(&[("A", 5e-7), ("B", -5e-7), ("C", 0.0)]));
        assert!(result.is_empty());
        assert!(settle(&BalanceMap::new()).is_empty());
    }

    #[test]
    fn debtor_split_across_several_creditors() {
        let result = settle(&balances(&[("A", 30.0), ("B", 20.0), ("C", -50.0)]));
        assert_eq!(result, vec![transfer("C", "A", 30.0), transfer("C", "B", 20.0)]);
        assert!(result.iter().all(|tx| tx.amount > 0.0));
    }

    #[test]
    fn input_snapshot_is_not_mutated() {
        let snapshot = balances(&[("A", 1.0), ("B", -1.0)]);
        let copy = snapshot.clone();
        let _ = settle(&snapshot);
        assert_eq!(snapshot, copy);
    }
}
