//! Split strategies that turn one expense into a zero-sum balance delta.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::LedgerError;

/// Per-user signed amounts. Positive means the user is owed money.
pub type BalanceMap = BTreeMap<String, f64>;

/// Allowed drift when comparing share totals against the expected sum.
pub const SHARE_TOLERANCE: f64 = 1e-6;

const PERCENT_TOTAL: f64 = 100.0;

/// Raw financial facts for one expense. Validation happens in the consuming strategy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitInput {
    pub payer_id: String,
    pub amount: f64,
    pub participant_ids: Vec<String>,
    #[serde(default)]
    pub exact_shares: Vec<f64>,
    #[serde(default)]
    pub percent_shares: Vec<f64>,
}

impl SplitInput {
    pub fn new(
        payer_id: impl Into<String>,
        amount: f64,
        participant_ids: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            payer_id: payer_id.into(),
            amount,
            participant_ids: participant_ids.into_iter().map(Into::into).collect(),
            exact_shares: Vec::new(),
            percent_shares: Vec::new(),
        }
    }

    pub fn with_exact_shares(mut self, shares: impl Into<Vec<f64>>) -> Self {
        self.exact_shares = shares.into();
        self
    }

    pub fn with_percent_shares(mut self, shares: impl Into<Vec<f64>>) -> Self {
        self.percent_shares = shares.into();
        self
    }

    pub fn includes_payer(&self) -> bool {
        self.participant_ids.iter().any(|id| id == &self.payer_id)
    }
}

/// Closed set of split algorithms, identified on disk by their lowercase tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SplitStrategy {
    Equal,
    Exact,
    Percent,
}

impl SplitStrategy {
    pub const ALL: [SplitStrategy; 3] = [
        SplitStrategy::Equal,
        SplitStrategy::Exact,
        SplitStrategy::Percent,
    ];

    /// Resolves a strategy from its tag, ignoring ASCII case.
    pub fn create(tag: &str) -> Result<Self, LedgerError> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "equal" => Ok(SplitStrategy::Equal),
            "exact" => Ok(SplitStrategy::Exact),
            "percent" => Ok(SplitStrategy::Percent),
            _ => Err(LedgerError::UnknownStrategy(tag.to_string())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SplitStrategy::Equal => "equal",
            SplitStrategy::Exact => "exact",
            SplitStrategy::Percent => "percent",
        }
    }

    /// Computes the delta for `input`. Nothing is built until every check has passed.
    pub fn compute_splits(self, input: &SplitInput) -> Result<BalanceMap, LedgerError> {
        ensure_amount(input.amount)?;
        match self {
            SplitStrategy::Equal => equal_split(input),
            SplitStrategy::Exact => exact_split(input),
            SplitStrategy::Percent => percent_split(input),
        }
    }
}

impl fmt::Display for SplitStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SplitStrategy {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SplitStrategy::create(s)
    }
}

fn ensure_amount(amount: f64) -> Result<(), LedgerError> {
    if !amount.is_finite() {
        return Err(LedgerError::validation("Expense amount must be a finite number"));
    }
    if amount < 0.0 {
        return Err(LedgerError::validation("Expense amount cannot be negative"));
    }
    Ok(())
}

fn ensure_finite_shares(shares: &[f64], label: &str) -> Result<(), LedgerError> {
    if shares.iter().all(|share| share.is_finite()) {
        Ok(())
    } else {
        Err(LedgerError::Validation(format!(
            "{label} split values must be finite numbers"
        )))
    }
}

fn credit_payer(input: &SplitInput) -> BalanceMap {
    let mut delta = BalanceMap::new();
    delta.insert(input.payer_id.clone(), input.amount);
    delta
}

fn debit(delta: &mut BalanceMap, user_id: &str, share: f64) {
    *delta.entry(user_id.to_string()).or_insert(0.0) -= share;
}

fn equal_split(input: &SplitInput) -> Result<BalanceMap, LedgerError> {
    if input.participant_ids.is_empty() {
        return Err(LedgerError::validation(
            "Equal split requires at least one participant",
        ));
    }

    let share = input.amount / input.participant_ids.len() as f64;
    let mut delta = credit_payer(input);
    for participant in &input.participant_ids {
        debit(&mut delta, participant, share);
    }
    Ok(delta)
}

fn exact_split(input: &SplitInput) -> Result<BalanceMap, LedgerError> {
    if input.participant_ids.len() != input.exact_shares.len() {
        return Err(LedgerError::validation(
            "Exact split requires values for each participant",
        ));
    }
    ensure_finite_shares(&input.exact_shares, "Exact")?;
    let total: f64 = input.exact_shares.iter().sum();
    if (total - input.amount).abs() > SHARE_TOLERANCE {
        return Err(LedgerError::Validation(format!(
            "Exact split shares must sum to the total amount (got {total}, expected {})",
            input.amount
        )));
    }

    let mut delta = credit_payer(input);
    for (participant, share) in input.participant_ids.iter().zip(&input.exact_shares) {
        debit(&mut delta, participant, *share);
    }
    Ok(delta)
}

fn percent_split(input: &SplitInput) -> Result<BalanceMap, LedgerError> {
    if input.participant_ids.len() != input.percent_shares.len() {
        return Err(LedgerError::validation(
            "Percent split requires percentages for each participant",
        ));
    }
    ensure_finite_shares(&input.percent_shares, "Percent")?;
    let total: f64 = input.percent_shares.iter().sum();
    if (total - PERCENT_TOTAL).abs() > SHARE_TOLERANCE {
        return Err(LedgerError::Validation(format!(
            "Percent split shares must sum to 100 (got {total})"
        )));
    }

    let mut delta = credit_payer(input);
    for (participant, percent) in input.participant_ids.iter().zip(&input.percent_shares) {
        debit(&mut delta, participant, input.amount * (percent / PERCENT_TOTAL));
    }
    Ok(delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    fn delta_sum(delta: &BalanceMap) -> f64 {
        delta.values().sum()
    }

    #[test]
    fn equal_split_distributes_amounts_evenly() {
        let input = SplitInput::new("payer", 100.0, ["payer", "a", "b", "c"]);
        let delta = SplitStrategy::Equal.compute_splits(&input).unwrap();
        assert_close(delta["payer"], 75.0);
        assert_close(delta["a"], -25.0);
        assert_close(delta["b"], -25.0);
        assert_close(delta["c"], -25.0);
        assert_close(delta_sum(&delta), 0.0);
    }

    #[test]
    fn equal_split_of_120_among_three() {
        let input = SplitInput::new("A", 120.0, ["A", "B", "C"]);
        let delta = SplitStrategy::Equal.compute_splits(&input).unwrap();
        assert_close(delta["A"], 80.0);
        assert_close(delta["B"], -40.0);
        assert_close(delta["C"], -40.0);
    }

    #[test]
    fn equal_split_rejects_empty_participants_and_negative_amounts() {
        let empty = SplitInput::default();
        let err = SplitStrategy::Equal.compute_splits(&empty).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let negative = SplitInput::new("A", -5.0, ["A"]);
        let err = SplitStrategy::Equal.compute_splits(&negative).unwrap_err();
        assert!(err.to_string().contains("negative"), "unexpected error: {err}");
    }

    #[test]
    fn zero_amount_produces_zero_delta() {
        let input = SplitInput::new("A", 0.0, ["A", "B"]);
        let delta = SplitStrategy::Equal.compute_splits(&input).unwrap();
        assert!(delta.values().all(|value| *value == 0.0));
    }

    #[test]
    fn exact_split_validates_totals() {
        let input =
            SplitInput::new("payer", 50.0, ["payer", "friend"]).with_exact_shares([25.0, 25.0]);
        let delta = SplitStrategy::Exact.compute_splits(&input).unwrap();
        assert_close(delta["payer"], 25.0);
        assert_close(delta["friend"], -25.0);

        let mismatch = input.with_exact_shares([30.0, 10.0]);
        let err = SplitStrategy::Exact.compute_splits(&mismatch).unwrap_err();
        assert!(
            matches!(err, LedgerError::Validation(ref message) if message.contains("sum to the total")),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn exact_split_accepts_totals_within_tolerance() {
        let input = SplitInput::new("A", 10.0, ["A", "B"]).with_exact_shares([5.0, 5.0000005]);
        assert!(SplitStrategy::Exact.compute_splits(&input).is_ok());

        let outside = SplitInput::new("A", 10.0, ["A", "B"]).with_exact_shares([5.0, 5.00001]);
        assert!(SplitStrategy::Exact.compute_splits(&outside).is_err());
    }

    #[test]
    fn percent_split_accepts_totals_within_tolerance() {
        let input = SplitInput::new("A", 90.0, ["A", "B", "C"])
            .with_percent_shares([33.3333335, 33.3333335, 33.333333]);
        let delta = SplitStrategy::Percent.compute_splits(&input).unwrap();
        assert!(delta.values().sum::<f64>().abs() < 1e-6);

        let outside = SplitInput::new("A", 90.0, ["A", "B", "C"])
            .with_percent_shares([33.34, 33.33, 33.34]);
        assert!(SplitStrategy::Percent.compute_splits(&outside).is_err());
    }

    #[test]
    fn exact_split_requires_one_share_per_participant() {
        let input = SplitInput::new("A", 10.0, ["A", "B"]).with_exact_shares([10.0]);
        let err = SplitStrategy::Exact.compute_splits(&input).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn percent_split_enforces_percentages() {
        let input =
            SplitInput::new("payer", 200.0, ["payer", "friend"]).with_percent_shares([40.0, 60.0]);
        let delta = SplitStrategy::Percent.compute_splits(&input).unwrap();
        assert_close(delta["payer"], 120.0);
        assert_close(delta["friend"], -120.0);

        let short = input.clone().with_percent_shares([30.0]);
        assert!(SplitStrategy::Percent.compute_splits(&short).is_err());

        let off = input.with_percent_shares([40.0, 50.0]);
        let err = SplitStrategy::Percent.compute_splits(&off).unwrap_err();
        assert!(err.to_string().contains("100"), "unexpected error: {err}");
    }

    #[test]
    fn percent_split_credits_payer_net_of_own_share() {
        let input =
            SplitInput::new("B", 60.0, ["A", "B", "C"]).with_percent_shares([30.0, 30.0, 40.0]);
        let delta = SplitStrategy::Percent.compute_splits(&input).unwrap();
        assert_close(delta["B"], 42.0);
        assert_close(delta["A"], -18.0);
        assert_close(delta["C"], -24.0);
        assert_close(delta_sum(&delta), 0.0);
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let nan_amount = SplitInput::new("A", f64::NAN, ["A"]);
        assert!(SplitStrategy::Equal.compute_splits(&nan_amount).is_err());

        let nan_share = SplitInput::new("A", 10.0, ["A", "B"]).with_exact_shares([f64::NAN, 10.0]);
        assert!(SplitStrategy::Exact.compute_splits(&nan_share).is_err());
    }

    #[test]
    fn factory_is_case_insensitive_and_round_trips_names() {
        assert_eq!(SplitStrategy::create("EQUAL").unwrap(), SplitStrategy::Equal);
        assert_eq!("Percent".parse::<SplitStrategy>().unwrap(), SplitStrategy::Percent);
        for strategy in SplitStrategy::ALL {
            assert_eq!(SplitStrategy::create(strategy.name()).unwrap(), strategy);
        }
    }

    #[test]
    fn factory_rejects_unknown_tags() {
        let err = SplitStrategy::create("midpoint").unwrap_err();
        assert!(matches!(err, LedgerError::UnknownStrategy(ref tag) if tag == "midpoint"));
    }
}
