use proptest::prelude::*;
use split_core::{
    ledger::{settle, BalanceMap, SplitInput, SplitStrategy},
    LedgerManager,
};

const DISCHARGE_TOLERANCE: f64 = 1e-5;

/// Builds a ledger of `member_count` users in one group and records one expense per entry.
fn build_ledger(
    member_count: usize,
    expenses: &[(u64, usize, usize, u8)],
) -> LedgerManager {
    let manager = LedgerManager::new();
    let members: Vec<String> = (0..member_count)
        .map(|idx| manager.add_user(&format!("Member {idx}")).unwrap())
        .collect();
    let group = manager.add_group("Everyone", &members).unwrap();

    for &(cents, payer_idx, mask, strategy) in expenses {
        let payer = &members[payer_idx % member_count];
        let mut participants: Vec<&String> = members
            .iter()
            .enumerate()
            .filter(|(idx, _)| mask & (1 << idx) != 0)
            .map(|(_, id)| id)
            .collect();
        if !participants.contains(&payer) {
            participants.push(payer);
        }
        let amount = cents as f64 / 100.0;
        let count = participants.len() as f64;
        let input = SplitInput::new(payer.as_str(), amount, participants.iter().copied());
        let (input, strategy) = match strategy % 3 {
            0 => (input, SplitStrategy::Equal),
            1 => {
                let shares = vec![amount / count; participants.len()];
                (input.with_exact_shares(shares), SplitStrategy::Exact)
            }
            _ => {
                let shares = vec![100.0 / count; participants.len()];
                (input.with_percent_shares(shares), SplitStrategy::Percent)
            }
        };
        manager
            .record_expense(&group, "generated", input, strategy)
            .unwrap();
    }
    manager
}

fn expense_strategy() -> impl Strategy<Value = Vec<(u64, usize, usize, u8)>> {
    prop::collection::vec((0u64..=100_000, 0usize..6, 0usize..64, 0u8..3), 0..=25)
}

proptest! {
    #[test]
    fn balances_sum_to_zero(member_count in 1usize..=6, expenses in expense_strategy()) {
        let manager = build_ledger(member_count, &expenses);
        let total: f64 = manager.balances().values().sum();
        prop_assert!(total.abs() < 1e-6, "total drifted to {total}");
    }
}

proptest! {
    #[test]
    fn settlement_discharges_all_balances(member_count in 1usize..=6, expenses in expense_strategy()) {
        let manager = build_ledger(member_count, &expenses);
        let mut balances: BalanceMap = manager.balances();
        let transfers = settle(&balances);

        for transfer in &transfers {
            prop_assert!(transfer.amount > 0.0);
            prop_assert_ne!(&transfer.from_user_id, &transfer.to_user_id);
            *balances.get_mut(&transfer.from_user_id).unwrap() += transfer.amount;
            *balances.get_mut(&transfer.to_user_id).unwrap() -= transfer.amount;
        }
        for (user, residual) in &balances {
            prop_assert!(residual.abs() <= DISCHARGE_TOLERANCE, "{user} left with {residual}");
        }
        prop_assert!(transfers.len() <= member_count.saturating_sub(1));
    }
}

proptest! {
    #[test]
    fn recompute_is_idempotent(member_count in 1usize..=6, expenses in expense_strategy()) {
        let manager = build_ledger(member_count, &expenses);
        let live = manager.balances();

        manager.recompute_balances().unwrap();
        let first = manager.balances();
        manager.recompute_balances().unwrap();
        prop_assert_eq!(&first, &manager.balances());

        for (user, value) in &live {
            let recomputed = first.get(user).copied().unwrap_or(0.0);
            prop_assert!((recomputed - value).abs() < 1e-9);
        }
    }
}

proptest! {
    #[test]
    fn settlement_is_deterministic(member_count in 1usize..=6, expenses in expense_strategy()) {
        let manager = build_ledger(member_count, &expenses);
        prop_assert_eq!(manager.settle_up(), manager.settle_up());
    }
}
