//! Best-price selection across bookmakers.

use smallvec::SmallVec;

use super::calculator::Leg;
use crate::market::OutcomeKey;

fn is_better(candidate: f64, current: f64) -> bool {
    candidate > current || (current.is_nan() && !candidate.is_nan())
}

/// Keep the highest-odd leg per outcome key.
///
/// Ties keep the first leg seen. Output order follows the first appearance
/// of each outcome key.
pub fn select_best_prices<I>(legs: I) -> Vec<Leg>
where
    I: IntoIterator<Item = Leg>,
{
    select_best_prices_by(legs, |leg| leg.odd)
}

/// Keep the leg with the highest `price(leg)` per outcome key.
///
/// Same tie and ordering rules as [`select_best_prices`].
pub fn select_best_prices_by<I, F>(legs: I, price: F) -> Vec<Leg>
where
    I: IntoIterator<Item = Leg>,
    F: Fn(&Leg) -> f64,
{
    let mut slots: SmallVec<[(OutcomeKey, usize); 4]> = SmallVec::new();
    let mut best: Vec<(Leg, f64)> = Vec::new();

    for leg in legs {
        let value = price(&leg);
        match slots.iter().find(|(key, _)| *key == leg.outcome_key) {
            Some(&(_, idx)) => {
                if is_better(value, best[idx].1) {
                    best[idx] = (leg, value);
                }
            }
            None => {
                slots.push((leg.outcome_key, best.len()));
                best.push((leg, value));
            }
        }
    }

    best.into_iter().map(|(leg, _)| leg).collect()
}
