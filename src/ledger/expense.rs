use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::split::{BalanceMap, SplitInput, SplitStrategy};
use crate::errors::LedgerError;

/// A recorded expense together with the strategy used to split it.
#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    pub id: String,
    pub group_id: String,
    pub description: String,
    pub input: SplitInput,
    pub strategy: SplitStrategy,
    pub recorded_at: Option<DateTime<Utc>>,
}

impl Expense {
    pub fn new(
        id: impl Into<String>,
        group_id: impl Into<String>,
        description: impl Into<String>,
        input: SplitInput,
        strategy: SplitStrategy,
    ) -> Self {
        Self {
            id: id.into(),
            group_id: group_id.into(),
            description: description.into(),
            input,
            strategy,
            recorded_at: Some(Utc::now()),
        }
    }

    pub fn amount(&self) -> f64 {
        self.input.amount
    }

    /// Re-derives this expense's delta from its stored input.
    pub fn delta(&self) -> Result<BalanceMap, LedgerError> {
        self.strategy.compute_splits(&self.input)
    }

    pub fn to_record(&self) -> ExpenseRecord {
        ExpenseRecord {
            id: self.id.clone(),
            group_id: self.group_id.clone(),
            description: self.description.clone(),
            payer_id: self.input.payer_id.clone(),
            amount: self.input.amount,
            participants: self.input.participant_ids.clone(),
            exact_shares: self.input.exact_shares.clone(),
            percent_shares: self.input.percent_shares.clone(),
            strategy: self.strategy.name().to_string(),
            recorded_at: self.recorded_at,
        }
    }

    /// Rebuilds an expense from its persisted form, resolving the strategy tag.
    pub fn from_record(record: ExpenseRecord) -> Result<Self, LedgerError> {
        let strategy = SplitStrategy::create(&record.strategy)?;
        Ok(Self {
            id: record.id,
            group_id: record.group_id,
            description: record.description,
            input: SplitInput {
                payer_id: record.payer_id,
                amount: record.amount,
                participant_ids: record.participants,
                exact_shares: record.exact_shares,
                percent_shares: record.percent_shares,
            },
            strategy,
            recorded_at: record.recorded_at,
        })
    }
}

/// On-disk shape of an expense. The strategy is kept as its raw tag until resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRecord {
    pub id: String,
    pub group_id: String,
    #[serde(default)]
    pub description: String,
    pub payer_id: String,
    pub amount: f64,
    pub participants: Vec<String>,
    #[serde(default)]
    pub exact_shares: Vec<f64>,
    #[serde(default)]
    pub percent_shares: Vec<f64>,
    pub strategy: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    fn taxi() -> Expense {
        Expense::new(
            "EXP3",
            "GRP1",
            "Taxi",
            SplitInput::new("C", 45.0, ["B", "C"]).with_exact_shares([20.0, 25.0]),
            SplitStrategy::Exact,
        )
    }

    #[test]
    fn record_round_trip_preserves_strategy_and_input() {
        let expense = taxi();
        let json = serde_json::to_string(&expense.to_record()).unwrap();
        assert!(json.contains("\"strategy\":\"exact\""));
        assert!(json.contains("\"groupId\":\"GRP1\""));

        let record: ExpenseRecord = serde_json::from_str(&json).unwrap();
        let restored = Expense::from_record(record).unwrap();
        assert_eq!(restored, expense);
    }

    #[test]
    fn tag_is_resolved_case_insensitively() {
        let mut record = taxi().to_record();
        record.strategy = "EXACT".into();
        assert_eq!(
            Expense::from_record(record).unwrap().strategy,
            SplitStrategy::Exact
        );
    }

    #[test]
    fn unknown_tag_surfaces_unknown_strategy() {
        let mut record = taxi().to_record();
        record.strategy = "midpoint".into();
        let err = Expense::from_record(record).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownStrategy);
    }

    #[test]
    fn missing_optional_fields_default() {
        let json = r#"{"id":"EXP1","groupId":"GRP1","payerId":"A","amount":10.0,
            "participants":["A","B"],"strategy":"equal"}"#;
        let record: ExpenseRecord = serde_json::from_str(json).unwrap();
        let expense = Expense::from_record(record).unwrap();
        assert!(expense.description.is_empty());
        assert!(expense.input.exact_shares.is_empty());
        assert!(expense.recorded_at.is_none());
    }
}
