//! In-memory board of the latest detected opportunities.
//!
//! The poll loop replaces a sport's entries after each fetch; the HTTP API
//! reads snapshots.

use dashmap::DashMap;
use time::OffsetDateTime;

use crate::arbitrage::OpportunityRecord;

/// Latest opportunities keyed by record id.
#[derive(Debug, Default)]
pub struct OpportunityBoard {
    records: DashMap<String, OpportunityRecord>,
}

impl OpportunityBoard {
    /// Create an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every record of `sport` with `records`.
    ///
    /// Returns the number of records that disappeared.
    pub fn replace_sport(&self, sport: &str, records: Vec<OpportunityRecord>) -> usize {
        let before = self.records.len();
        self.records.retain(|_, r| r.sport_key != sport);
        let removed = before - self.records.len();

        for record in records {
            self.records.insert(record.id.clone(), record);
        }
        removed
    }

    /// Drop records detected before `cutoff`.
    ///
    /// Returns the number of records dropped.
    pub fn expire_before(&self, cutoff: OffsetDateTime) -> usize {
        let before = self.records.len();
        self.records.retain(|_, r| r.detected_at >= cutoff);
        before - self.records.len()
    }

    /// All records, best ROI first; ties ordered by id.
    pub fn snapshot(&self) -> Vec<OpportunityRecord> {
        let mut records: Vec<OpportunityRecord> =
            self.records.iter().map(|r| r.value().clone()).collect();
        records.sort_by(|a, b| b.roi_pct.cmp(&a.roi_pct).then_with(|| a.id.cmp(&b.id)));
        records
    }

    /// Record by id.
    pub fn get(&self, id: &str) -> Option<OpportunityRecord> {
        self.records.get(id).map(|r| r.value().clone())
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the board is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::{FamilyKind, Period};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn record(id: &str, sport: &str, roi_pct: Decimal) -> OpportunityRecord {
        OpportunityRecord {
            id: id.to_string(),
            event_id: id.to_string(),
            sport_key: sport.to_string(),
            matchup: "A vs B".to_string(),
            family: FamilyKind::Moneyline,
            period: Period::FullTime,
            line: None,
            roi_pct,
            profit: Decimal::ZERO,
            total_stake: Decimal::ZERO,
            legs: Vec::new(),
            commence_time: None,
            detected_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn snapshot_sorted_by_roi() {
        let board = OpportunityBoard::new();
        board.replace_sport(
            "soccer_epl",
            vec![
                record("a", "soccer_epl", dec!(0.5)),
                record("b", "soccer_epl", dec!(2.1)),
                record("c", "soccer_epl", dec!(0.5)),
            ],
        );

        let ids: Vec<String> = board.snapshot().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn replace_only_touches_one_sport() {
        let board = OpportunityBoard::new();
        board.replace_sport("soccer_epl", vec![record("a", "soccer_epl", dec!(1))]);
        board.replace_sport("basketball_nba", vec![record("n", "basketball_nba", dec!(1))]);

        let removed = board.replace_sport("soccer_epl", vec![record("z", "soccer_epl", dec!(3))]);

        assert_eq!(removed, 1);
        assert_eq!(board.len(), 2);
        assert!(board.get("a").is_none());
        assert!(board.get("n").is_some());
        assert!(board.get("z").is_some());
    }

    #[test]
    fn expire_drops_only_old_records() {
        let board = OpportunityBoard::new();
        let fresh = OffsetDateTime::UNIX_EPOCH + time::Duration::hours(2);
        let mut kept = record("fresh", "soccer_epl", dec!(1));
        kept.detected_at = fresh;
        board.replace_sport("soccer_epl", vec![kept]);
        board.replace_sport("basketball_nba", vec![record("old", "basketball_nba", dec!(2))]);

        let dropped = board.expire_before(OffsetDateTime::UNIX_EPOCH + time::Duration::hours(1));

        assert_eq!(dropped, 1);
        assert!(board.get("old").is_none());
        assert!(board.get("fresh").is_some());
    }
}
