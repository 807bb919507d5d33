//! Sequential, prefix-scoped identifiers such as `USR3` or `EXP12`.

use std::collections::BTreeMap;

pub const USER_PREFIX: &str = "USR";
pub const GROUP_PREFIX: &str = "GRP";
pub const EXPENSE_PREFIX: &str = "EXP";

/// Returns the numeric suffix of `id` when it follows the `<prefix><n>` pattern.
pub fn sequence_of(id: &str, prefix: &str) -> Option<u64> {
    let digits = id.strip_prefix(prefix)?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Per-prefix counters. The next id for a prefix is always one past the highest issued.
#[derive(Debug, Clone, Default)]
pub struct IdCounters {
    counters: BTreeMap<&'static str, u64>,
}

impl IdCounters {
    pub fn next(&mut self, prefix: &'static str) -> String {
        let counter = self.counters.entry(prefix).or_insert(0);
        *counter += 1;
        format!("{prefix}{counter}")
    }

    /// Advances `prefix` past the largest well-formed suffix in `ids`; other ids are ignored.
    ///
    /// Counters never move backwards, so an id is not issued twice. Use [`reset`](Self::reset)
    /// before resuming from a different ledger.
    pub fn resume_from<'a>(&mut self, prefix: &'static str, ids: impl IntoIterator<Item = &'a str>) {
        let max = ids
            .into_iter()
            .filter_map(|id| sequence_of(id, prefix))
            .max()
            .unwrap_or(0);
        let counter = self.counters.entry(prefix).or_insert(0);
        *counter = (*counter).max(max);
    }

    pub fn reset(&mut self) {
        self.counters.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_independent_per_prefix() {
        let mut ids = IdCounters::default();
        assert_eq!(ids.next(USER_PREFIX), "USR1");
        assert_eq!(ids.next(USER_PREFIX), "USR2");
        assert_eq!(ids.next(GROUP_PREFIX), "GRP1");
    }

    #[test]
    fn resume_skips_malformed_ids() {
        let mut ids = IdCounters::default();
        ids.resume_from(EXPENSE_PREFIX, ["EXP2", "EXP10", "EXPx", "legacy-7", "EXP"]);
        assert_eq!(ids.next(EXPENSE_PREFIX), "EXP11");
    }

    #[test]
    fn resume_never_rewinds_a_counter() {
        let mut ids = IdCounters::default();
        for _ in 0..5 {
            ids.next(EXPENSE_PREFIX);
        }
        ids.resume_from(EXPENSE_PREFIX, ["EXP2"]);
        assert_eq!(ids.next(EXPENSE_PREFIX), "EXP6");

        ids.reset();
        ids.resume_from(EXPENSE_PREFIX, ["EXP2"]);
        assert_eq!(ids.next(EXPENSE_PREFIX), "EXP3");
    }

    #[test]
    fn sequence_requires_digits_only() {
        assert_eq!(sequence_of("USR42", USER_PREFIX), Some(42));
        assert_eq!(sequence_of("USR4a", USER_PREFIX), None);
        assert_eq!(sequence_of("GRP4", USER_PREFIX), None);
    }
}
