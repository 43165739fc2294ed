//! Per-day, per-sport provider request budget.

use dashmap::DashMap;
use time::{Date, OffsetDateTime};
use tracing::debug;

use crate::error::BudgetError;

/// Request counter keyed by (UTC day, sport) with a fixed daily ceiling.
#[derive(Debug)]
pub struct DailyBudget {
    limit: u32,
    used: DashMap<(Date, String), u32>,
}

impl DailyBudget {
    /// Create a budget allowing `limit` requests per sport per day.
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            used: DashMap::new(),
        }
    }

    /// Configured ceiling.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Reserve one request for `sport` today (UTC).
    ///
    /// Counters of earlier days are dropped first. Returns the allowance left
    /// after this request.
    pub fn try_acquire(&self, sport: &str) -> Result<u32, BudgetError> {
        let today = OffsetDateTime::now_utc().date();
        self.prune_before(today);
        self.try_acquire_on(today, sport)
    }

    /// Reserve one request for `sport` on `day`.
    pub fn try_acquire_on(&self, day: Date, sport: &str) -> Result<u32, BudgetError> {
        let mut used = self.used.entry((day, sport.to_string())).or_insert(0);
        if *used >= self.limit {
            return Err(BudgetError::Exhausted {
                sport: sport.to_string(),
                day,
                limit: self.limit,
            });
        }
        *used += 1;
        let remaining = self.limit - *used;
        debug!(sport = %sport, %day, used = *used, remaining, "Request budget reserved");
        Ok(remaining)
    }

    /// Requests spent for `sport` on `day`.
    pub fn used(&self, day: Date, sport: &str) -> u32 {
        self.used
            .get(&(day, sport.to_string()))
            .map(|count| *count)
            .unwrap_or(0)
    }

    /// Drop counters for days before `day`.
    pub fn prune_before(&self, day: Date) {
        self.used.retain(|(d, _), _| *d >= day);
    }
}
