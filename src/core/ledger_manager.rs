use std::{
    collections::{BTreeMap, BTreeSet},
    panic::{self, AssertUnwindSafe},
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use tracing::{debug, info, warn};

use crate::core::notifier::ExpenseNotifier;
use crate::errors::LedgerError;
use crate::ledger::{
    ids::{self, EXPENSE_PREFIX, GROUP_PREFIX, USER_PREFIX},
    settle, BalanceMap, BalanceSheet, Expense, Group, IdCounters, SettlementTransaction,
    SplitInput, SplitStrategy, User, SETTLEMENT_EPSILON,
};

/// Plain copy of everything the ledger owns, used to hand state to and from persistence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerSnapshot {
    pub users: Vec<User>,
    pub groups: Vec<Group>,
    pub expenses: Vec<Expense>,
    pub balances: BalanceMap,
}

#[derive(Default)]
struct LedgerState {
    users: BTreeMap<String, User>,
    groups: BTreeMap<String, Group>,
    expenses: Vec<Expense>,
    sheet: BalanceSheet,
    ids: IdCounters,
    notifier: Option<Arc<dyn ExpenseNotifier>>,
    notification_threshold: Option<f64>,
    dirty: bool,
}

struct PendingAlert {
    notifier: Arc<dyn ExpenseNotifier>,
    expense: Expense,
    threshold: f64,
}

/// Owns users, groups, the expense history, and the authoritative balance sheet.
///
/// Every mutation runs under one exclusive lock so that "validate, compute delta,
/// apply delta" is observed atomically. Reads take the shared side of the same lock
/// and therefore always see a fully-applied sheet.
#[derive(Default)]
pub struct LedgerManager {
    state: RwLock<LedgerState>,
}

impl LedgerManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, LedgerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, LedgerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_user(&self, name: &str) -> Result<String, LedgerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::validation("User name cannot be empty"));
        }
        let mut state = self.write();
        let id = state.ids.next(USER_PREFIX);
        state.users.insert(id.clone(), User::new(id.clone(), name));
        state.dirty = true;
        info!(user_id = %id, "user added");
        Ok(id)
    }

    pub fn add_group(&self, name: &str, member_ids: &[String]) -> Result<String, LedgerError> {
        let mut state = self.write();
        if let Some(unknown) = member_ids
            .iter()
            .find(|member| !state.users.contains_key(member.as_str()))
        {
            return Err(LedgerError::Validation(format!("Unknown user id: {unknown}")));
        }
        let id = state.ids.next(GROUP_PREFIX);
        let group = Group::new(id.clone(), name.trim(), member_ids.iter().cloned());
        state.groups.insert(id.clone(), group);
        state.dirty = true;
        info!(group_id = %id, members = member_ids.len(), "group added");
        Ok(id)
    }

    /// Validates, splits, and applies one expense. On any error the ledger is left untouched.
    pub fn record_expense(
        &self,
        group_id: &str,
        description: &str,
        input: SplitInput,
        strategy: SplitStrategy,
    ) -> Result<String, LedgerError> {
        let (expense_id, alert) = {
            let mut state = self.write();
            let group = state
                .groups
                .get(group_id)
                .ok_or_else(|| LedgerError::Validation(format!("Unknown group id: {group_id}")))?;
            validate_membership(group, &input)?;
            let delta = strategy.compute_splits(&input)?;

            let id = state.ids.next(EXPENSE_PREFIX);
            let expense = Expense::new(id.clone(), group_id, description, input, strategy);
            state.sheet.apply_delta(&delta);
            debug!(expense_id = %id, users = delta.len(), "delta applied");

            let alert = match (&state.notifier, state.notification_threshold) {
                (Some(notifier), Some(threshold)) if expense.amount() > threshold => {
                    Some(PendingAlert {
                        notifier: Arc::clone(notifier),
                        expense: expense.clone(),
                        threshold,
                    })
                }
                _ => None,
            };
            state.expenses.push(expense);
            state.dirty = true;
            (id, alert)
        };

        info!(expense_id = %expense_id, group_id, %strategy, "expense recorded");
        if let Some(alert) = alert {
            deliver(alert);
        }
        Ok(expense_id)
    }

    /// Replaces the expense history and rebuilds the sheet by replaying it in id order.
    ///
    /// Every delta is computed before the sheet is touched, so a failing expense leaves
    /// the previous history and balances in place.
    pub fn recompute_from_history(&self, expenses: Vec<Expense>) -> Result<(), LedgerError> {
        let mut state = self.write();
        rebuild(&mut state, expenses)
    }

    /// Rebuilds the sheet from the history already held by the ledger.
    pub fn recompute_balances(&self) -> Result<(), LedgerError> {
        let mut state = self.write();
        let history = state.expenses.clone();
        rebuild(&mut state, history)
    }

    /// Installs a persisted snapshot after checking it with the same rules as live input.
    ///
    /// Returns warnings for stored balances that disagree with the recomputed sheet.
    pub fn restore(&self, snapshot: LedgerSnapshot) -> Result<Vec<String>, LedgerError> {
        let LedgerSnapshot {
            users,
            groups,
            expenses,
            balances: stored,
        } = snapshot;

        let users: BTreeMap<String, User> = users
            .into_iter()
            .map(|user| (user.id.clone(), user))
            .collect();
        let mut group_map = BTreeMap::new();
        for group in groups {
            if let Some(unknown) = group
                .member_ids
                .iter()
                .find(|member| !users.contains_key(member.as_str()))
            {
                return Err(LedgerError::Validation(format!(
                    "Group '{}' references unknown user '{unknown}'",
                    group.id
                )));
            }
            group_map.insert(group.id.clone(), group);
        }

        let ordered = order_by_sequence(expenses);
        let mut sheet = BalanceSheet::new();
        for expense in &ordered {
            let group = group_map.get(&expense.group_id).ok_or_else(|| {
                LedgerError::Validation(format!(
                    "Expense '{}' references unknown group '{}'",
                    expense.id, expense.group_id
                ))
            })?;
            validate_membership(group, &expense.input)
                .and_then(|_| expense.delta())
                .map(|delta| sheet.apply_delta(&delta))
                .map_err(|err| with_expense_context(&expense.id, err))?;
        }

        let warnings = balance_drift(&stored, sheet.balances());
        for warning in &warnings {
            warn!("{warning}");
        }

        let mut state = self.write();
        state.ids.reset();
        state.ids.resume_from(USER_PREFIX, users.keys().map(String::as_str));
        state
            .ids
            .resume_from(GROUP_PREFIX, group_map.keys().map(String::as_str));
        state
            .ids
            .resume_from(EXPENSE_PREFIX, ordered.iter().map(|expense| expense.id.as_str()));
        state.users = users;
        state.groups = group_map;
        state.expenses = ordered;
        state.sheet = sheet;
        state.dirty = false;
        info!(
            users = state.users.len(),
            groups = state.groups.len(),
            expenses = state.expenses.len(),
            "ledger restored"
        );
        Ok(warnings)
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        let state = self.read();
        LedgerSnapshot {
            users: state.users.values().cloned().collect(),
            groups: state.groups.values().cloned().collect(),
            expenses: state.expenses.clone(),
            balances: state.sheet.balances().clone(),
        }
    }

    pub fn balances(&self) -> BalanceMap {
        self.read().sheet.balances().clone()
    }

    /// Greedy settlement over a consistent snapshot of the current balances.
    pub fn settle_up(&self) -> Vec<SettlementTransaction> {
        let state = self.read();
        settle(state.sheet.balances())
    }

    pub fn users(&self) -> Vec<User> {
        self.read().users.values().cloned().collect()
    }

    pub fn user(&self, id: &str) -> Option<User> {
        self.read().users.get(id).cloned()
    }

    pub fn groups(&self) -> Vec<Group> {
        self.read().groups.values().cloned().collect()
    }

    pub fn expenses(&self) -> Vec<Expense> {
        self.read().expenses.clone()
    }

    pub fn set_notifier(&self, notifier: Option<Arc<dyn ExpenseNotifier>>) {
        self.write().notifier = notifier;
    }

    /// Sets the amount above which the notifier fires. `None` disables alerts.
    pub fn set_notification_threshold(&self, threshold: Option<f64>) -> Result<(), LedgerError> {
        if let Some(value) = threshold {
            if value.is_nan() || value < 0.0 {
                return Err(LedgerError::Validation(format!(
                    "Notification threshold must be a non-negative number, got {value}"
                )));
            }
        }
        self.write().notification_threshold = threshold;
        Ok(())
    }

    pub fn notification_threshold(&self) -> Option<f64> {
        self.read().notification_threshold
    }

    /// True when the ledger changed since the last restore or [`mark_saved`](Self::mark_saved).
    pub fn is_dirty(&self) -> bool {
        self.read().dirty
    }

    pub fn mark_saved(&self) {
        self.write().dirty = false;
    }

    /// Drops all users, groups, expenses, balances, and id counters.
    pub fn clear(&self) {
        let mut state = self.write();
        state.users.clear();
        state.groups.clear();
        state.expenses.clear();
        state.sheet.clear();
        state.ids.reset();
        state.dirty = false;
    }
}

// Runs under the caller's write guard so the replay and install are one critical section.
fn rebuild(state: &mut LedgerState, expenses: Vec<Expense>) -> Result<(), LedgerError> {
    let ordered = order_by_sequence(expenses);
    let deltas = ordered
        .iter()
        .map(|expense| {
            expense
                .delta()
                .map_err(|err| with_expense_context(&expense.id, err))
        })
        .collect::<Result<Vec<_>, _>>()?;

    state.sheet.clear();
    for delta in &deltas {
        state.sheet.apply_delta(delta);
    }
    state
        .ids
        .resume_from(EXPENSE_PREFIX, ordered.iter().map(|expense| expense.id.as_str()));
    state.expenses = ordered;
    debug!(expenses = deltas.len(), "balances recomputed from history");
    Ok(())
}

fn validate_membership(group: &Group, input: &SplitInput) -> Result<(), LedgerError> {
    if input.participant_ids.is_empty() {
        return Err(LedgerError::validation(
            "Expense must include at least one participant",
        ));
    }
    if !group.has_member(&input.payer_id) {
        return Err(LedgerError::Validation(format!(
            "Payer {} must be part of group {}",
            input.payer_id, group.id
        )));
    }
    if !input.includes_payer() {
        return Err(LedgerError::validation("Participants must include the payer"));
    }
    if let Some(outsider) = input
        .participant_ids
        .iter()
        .find(|participant| !group.has_member(participant))
    {
        return Err(LedgerError::Validation(format!(
            "Participant not in group: {outsider}"
        )));
    }
    Ok(())
}

fn with_expense_context(expense_id: &str, err: LedgerError) -> LedgerError {
    match err {
        LedgerError::Validation(message) => {
            LedgerError::Validation(format!("Expense '{expense_id}': {message}"))
        }
        other => other,
    }
}

// Ascending id sequence (EXP2 before EXP10); ids without a numeric suffix keep their relative order at the end.
fn order_by_sequence(mut expenses: Vec<Expense>) -> Vec<Expense> {
    expenses.sort_by_key(|expense| match ids::sequence_of(&expense.id, EXPENSE_PREFIX) {
        Some(sequence) => (0, sequence),
        None => (1, 0),
    });
    expenses
}

fn balance_drift(stored: &BalanceMap, recomputed: &BalanceMap) -> Vec<String> {
    let users: BTreeSet<&String> = stored.keys().chain(recomputed.keys()).collect();
    users
        .into_iter()
        .filter_map(|user| {
            let before = stored.get(user).copied().unwrap_or(0.0);
            let after = recomputed.get(user).copied().unwrap_or(0.0);
            ((before - after).abs() > SETTLEMENT_EPSILON).then(|| {
                format!("stored balance for {user} ({before}) differs from recomputed ({after})")
            })
        })
        .collect()
}

fn deliver(alert: PendingAlert) {
    let PendingAlert {
        notifier,
        expense,
        threshold,
    } = alert;
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        notifier.notify_large_expense(&expense, threshold)
    }));
    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!(expense_id = %expense.id, "{err}"),
        Err(_) => warn!(expense_id = %expense.id, "notifier panicked"),
    }
}
