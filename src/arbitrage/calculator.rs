//! Surebet evaluation and equal-payout stake allocation.
//!
//! [`evaluate`] is total: every input, including empty or nonsensical leg
//! sets, produces an [`ArbResult`]. Rejections are reported through
//! `is_arb = false` and the numeric fields, never through errors.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum::Display;
use utoipa::ToSchema;

use crate::market::OutcomeKey;

/// Sum of inverses must be strictly below this to count as arbitrage.
/// Sits just under 1.0 to absorb floating-point noise from the divisions.
pub const DEFAULT_ARB_THRESHOLD: f64 = 0.999999;

/// Stakes are truncated to cents.
pub const DEFAULT_STAKE_DECIMALS: u32 = 2;

/// One candidate bet: the best price for one canonical outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Leg {
    /// Bookmaker identifier.
    pub book_id: String,
    /// Bookmaker display name.
    pub book_name: String,
    /// Normalized outcome.
    pub outcome_key: OutcomeKey,
    /// Decimal odd (gross payout multiple).
    pub odd: f64,
}

impl Leg {
    /// Create a new leg.
    pub fn new(
        book_id: impl Into<String>,
        book_name: impl Into<String>,
        outcome_key: OutcomeKey,
        odd: f64,
    ) -> Self {
        Self {
            book_id: book_id.into(),
            book_name: book_name.into(),
            outcome_key,
            odd,
        }
    }
}

/// A leg with its allocated stake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComputedLeg {
    /// Bookmaker identifier.
    pub book_id: String,
    /// Bookmaker display name.
    pub book_name: String,
    /// Normalized outcome.
    pub outcome_key: OutcomeKey,
    /// Quoted decimal odd.
    pub odd: f64,
    /// Odd after commission; equals `odd` when no commission applies.
    pub net_odd: f64,
    /// Commission rate applied to winnings.
    pub commission: f64,
    /// `1 / net_odd`.
    pub implied_prob: f64,
    /// Amount to place.
    pub stake: f64,
    /// `stake * net_odd`.
    pub payout: f64,
}

/// Why a leg set was not executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Rejection {
    /// Sum of inverses not below the threshold.
    NoArbitrage,
    /// Theoretical ROI below the requested minimum.
    BelowMinRoi,
    /// Stake truncation wiped out the edge.
    RoundingErased,
}

/// Evaluation result for one candidate leg set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArbResult {
    /// True only when a profitable, executable allocation exists.
    pub is_arb: bool,
    /// Total implied probability.
    pub sum_inverse: f64,
    /// Theoretical ROI, `1/sum_inverse - 1`; reported even when rejected.
    pub roi: f64,
    /// Guaranteed profit after rounding; non-positive when rounding erased the edge.
    pub profit: f64,
    /// Allocated legs; empty unless `is_arb`.
    pub legs: Vec<ComputedLeg>,
    /// Set when `is_arb` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection: Option<Rejection>,
}

impl ArbResult {
    fn rejected(sum_inverse: f64, roi: f64, profit: f64, rejection: Rejection) -> Self {
        Self {
            is_arb: false,
            sum_inverse,
            roi,
            profit,
            legs: Vec::new(),
            rejection: Some(rejection),
        }
    }

    /// ROI as a percentage.
    pub fn roi_pct(&self) -> f64 {
        self.roi * 100.0
    }

    /// Sum of allocated stakes.
    pub fn total_stake(&self) -> f64 {
        self.legs.iter().map(|l| l.stake).sum()
    }

    /// Smallest payout across legs (the guaranteed return).
    pub fn min_payout(&self) -> Option<f64> {
        self.legs.iter().map(|l| l.payout).reduce(f64::min)
    }
}

/// How raw stakes are turned into placeable amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundingMode {
    /// Truncate toward negative infinity at `decimals` places.
    Floor {
        /// Decimal places kept.
        decimals: u32,
    },
    /// Keep raw stakes.
    Exact,
}

impl Default for RoundingMode {
    fn default() -> Self {
        RoundingMode::Floor {
            decimals: DEFAULT_STAKE_DECIMALS,
        }
    }
}

impl RoundingMode {
    /// Apply the rounding to a raw stake. Never rounds up.
    pub fn apply(&self, raw: f64) -> f64 {
        match self {
            RoundingMode::Floor { decimals } => {
                let factor = 10f64.powi(*decimals as i32);
                (raw * factor).floor() / factor
            }
            RoundingMode::Exact => raw,
        }
    }
}

/// Commission charged on winnings.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Commission {
    /// No commission.
    #[default]
    None,
    /// Same rate for every leg.
    Flat(f64),
    /// Rate per bookmaker id; missing books pay nothing.
    PerBook(HashMap<String, f64>),
}

impl Commission {
    /// Rate for a bookmaker.
    pub fn rate_for(&self, book_id: &str) -> f64 {
        match self {
            Commission::None => 0.0,
            Commission::Flat(rate) => *rate,
            Commission::PerBook(rates) => rates.get(book_id).copied().unwrap_or(0.0),
        }
    }
}

/// Immutable engine tuning, built once from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOptions {
    /// Sum of inverses must be strictly below this.
    pub arb_threshold: f64,
    /// Stake rounding.
    pub rounding: RoundingMode,
    /// Commission on winnings.
    pub commission: Commission,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            arb_threshold: DEFAULT_ARB_THRESHOLD,
            rounding: RoundingMode::default(),
            commission: Commission::None,
        }
    }
}

/// Odd after commission on winnings.
pub fn net_odd(odd: f64, commission: f64) -> f64 {
    if commission == 0.0 {
        odd
    } else {
        1.0 + (odd - 1.0) * (1.0 - commission)
    }
}

/// Contribution of one odd to the sum of inverses.
///
/// Odds at or below 1 (and non-finite odds) count as a full unit, which
/// pushes the sum to at least 1 and rules out arbitrage.
fn inverse(odd: f64) -> f64 {
    if odd.is_finite() && odd > 1.0 {
        1.0 / odd
    } else {
        1.0
    }
}

/// Evaluate a leg set with default options.
pub fn calculate_surebet(legs: &[Leg], total_investment: f64, min_roi: f64) -> ArbResult {
    evaluate(legs, total_investment, min_roi, &EngineOptions::default())
}

/// Evaluate a leg set and allocate stakes so every outcome pays the same.
///
/// Expects at most one leg per outcome key, covering the whole market.
pub fn evaluate(
    legs: &[Leg],
    total_investment: f64,
    min_roi: f64,
    options: &EngineOptions,
) -> ArbResult {
    let priced: Vec<(f64, f64, f64)> = legs
        .iter()
        .map(|leg| {
            let commission = options.commission.rate_for(&leg.book_id);
            let net = net_odd(leg.odd, commission);
            (commission, net, inverse(net))
        })
        .collect();

    let sum_inverse: f64 = priced.iter().map(|&(_, _, inv)| inv).sum();
    let is_arb = sum_inverse < options.arb_threshold && sum_inverse > 0.0;
    let roi = if sum_inverse > 0.0 {
        1.0 / sum_inverse - 1.0
    } else {
        0.0
    };

    if !is_arb {
        return ArbResult::rejected(sum_inverse, roi, 0.0, Rejection::NoArbitrage);
    }
    if roi < min_roi {
        return ArbResult::rejected(sum_inverse, roi, 0.0, Rejection::BelowMinRoi);
    }

    let computed: Vec<ComputedLeg> = legs
        .iter()
        .zip(&priced)
        .map(|(leg, &(commission, net, inv))| {
            let raw_stake = total_investment * inv / sum_inverse;
            let stake = options.rounding.apply(raw_stake);
            ComputedLeg {
                book_id: leg.book_id.clone(),
                book_name: leg.book_name.clone(),
                outcome_key: leg.outcome_key,
                odd: leg.odd,
                net_odd: net,
                commission,
                implied_prob: inv,
                stake,
                payout: stake * net,
            }
        })
        .collect();

    let total_staked: f64 = computed.iter().map(|l| l.stake).sum();
    let min_payout = computed
        .iter()
        .map(|l| l.payout)
        .fold(f64::INFINITY, f64::min);
    let real_profit = min_payout - total_staked;

    // NaN profit (from NaN investment) is rejected too
    if !(real_profit > 0.0) {
        return ArbResult::rejected(sum_inverse, roi, real_profit, Rejection::RoundingErased);
    }

    ArbResult {
        is_arb: true,
        sum_inverse,
        roi,
        profit: real_profit,
        legs: computed,
        rejection: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const EPS: f64 = 1e-9;

    fn leg(key: OutcomeKey, odd: f64) -> Leg {
        Leg::new(format!("book-{}", key), format!("Book {}", key), key, odd)
    }

    fn three_way() -> Vec<Leg> {
        vec![
            leg(OutcomeKey::Home, 2.10),
            leg(OutcomeKey::Draw, 3.40),
            leg(OutcomeKey::Away, 4.50),
        ]
    }

    #[test]
    fn profitable_three_way_allocates_floored_stakes() {
        let result = calculate_surebet(&three_way(), 1000.0, 0.0);

        assert!(result.is_arb);
        assert!((result.sum_inverse - 0.992_530_345_471_521_9).abs() < EPS);
        assert!((result.roi - 0.007_525_870_178_739_513).abs() < EPS);
        assert_eq!(result.rejection, None);

        let stakes: Vec<f64> = result.legs.iter().map(|l| l.stake).collect();
        assert_eq!(stakes, vec![479.77, 296.33, 223.89]);
        assert!((result.profit - 7.515).abs() < 1e-6);
        assert!(result.profit > 0.0);

        let home = &result.legs[0];
        assert_eq!(home.outcome_key, OutcomeKey::Home);
        assert_eq!(home.book_name, "Book HOME");
        assert!((home.implied_prob - 1.0 / 2.10).abs() < EPS);
        assert!((home.payout - 479.77 * 2.10).abs() < EPS);
    }

    #[test]
    fn no_arbitrage_when_sum_inverse_above_one() {
        let legs = vec![leg(OutcomeKey::Home, 1.80), leg(OutcomeKey::Away, 1.80)];
        let result = calculate_surebet(&legs, 1000.0, 0.0);

        assert!(!result.is_arb);
        assert!((result.sum_inverse - 1.111_111_111_111_111_2).abs() < EPS);
        assert!(result.legs.is_empty());
        assert_eq!(result.profit, 0.0);
        assert!(result.roi < 0.0);
        assert_eq!(result.rejection, Some(Rejection::NoArbitrage));
    }

    #[test]
    fn rounding_can_erase_a_thin_edge() {
        let legs = vec![leg(OutcomeKey::Home, 1.02), leg(OutcomeKey::Away, 60.0)];
        let result = calculate_surebet(&legs, 1.0, 0.0);

        assert!(result.sum_inverse < DEFAULT_ARB_THRESHOLD);
        assert!(result.roi > 0.0);
        assert!(!result.is_arb);
        assert!(result.legs.is_empty());
        assert!(result.profit <= 0.0);
        assert!((result.profit - (-0.39)).abs() < 1e-9);
        assert_eq!(result.rejection, Some(Rejection::RoundingErased));
    }

    #[test]
    fn degenerate_odd_blocks_arbitrage() {
        for bad in [1.0, 0.5, 0.0, -3.0, f64::NAN, f64::INFINITY] {
            let legs = vec![
                leg(OutcomeKey::Home, 50.0),
                leg(OutcomeKey::Draw, 50.0),
                leg(OutcomeKey::Away, bad),
            ];
            let result = calculate_surebet(&legs, 1000.0, 0.0);
            assert!(!result.is_arb, "odd {bad} must not produce an arbitrage");
            assert!(result.sum_inverse >= 1.0);
            assert!(result.legs.is_empty());
        }
    }

    #[test]
    fn empty_leg_set_is_not_arbitrage() {
        let result = calculate_surebet(&[], 1000.0, 0.0);

        assert!(!result.is_arb);
        assert_eq!(result.sum_inverse, 0.0);
        assert_eq!(result.roi, 0.0);
        assert_eq!(result.profit, 0.0);
    }

    #[test]
    fn threshold_is_strictly_below_one() {
        // below 1.0 but inside the noise band
        let legs = vec![leg(OutcomeKey::Over, 2.000001), leg(OutcomeKey::Under, 2.000001)];
        let result = calculate_surebet(&legs, 1000.0, 0.0);
        assert!(result.sum_inverse < 1.0);
        assert!(result.sum_inverse > DEFAULT_ARB_THRESHOLD);
        assert!(result.roi > 0.0);
        assert!(!result.is_arb);

        let legs = vec![leg(OutcomeKey::Over, 2.0), leg(OutcomeKey::Under, 2.0)];
        let result = calculate_surebet(&legs, 1000.0, 0.0);
        assert!(!result.is_arb);
        assert_eq!(result.sum_inverse, 1.0);
        assert_eq!(result.roi, 0.0);
    }

    #[test]
    fn min_roi_filters_before_allocation() {
        let result = calculate_surebet(&three_way(), 1000.0, 0.01);

        assert!(!result.is_arb);
        assert!(result.roi > 0.0 && result.roi < 0.01);
        assert_eq!(result.profit, 0.0);
        assert!(result.legs.is_empty());
        assert_eq!(result.rejection, Some(Rejection::BelowMinRoi));
    }

    #[test]
    fn payouts_equal_up_to_one_cent_per_leg() {
        let result = calculate_surebet(&three_way(), 1000.0, 0.0);

        for a in &result.legs {
            for b in &result.legs {
                let bound = 0.01 * a.odd.max(b.odd);
                assert!((a.payout - b.payout).abs() <= bound);
            }
        }
    }

    #[test]
    fn rounded_stake_never_exceeds_raw_stake() {
        let legs = three_way();
        let result = calculate_surebet(&legs, 1234.567, 0.0);

        for computed in &result.legs {
            let raw = 1234.567 * computed.implied_prob / result.sum_inverse;
            assert!(computed.stake <= raw);
            assert!(raw - computed.stake < 0.01);
        }
    }

    #[test]
    fn scaling_investment_scales_stakes_and_profit() {
        let small = calculate_surebet(&three_way(), 1000.0, 0.0);
        let large = calculate_surebet(&three_way(), 10_000.0, 0.0);

        assert_eq!(small.sum_inverse, large.sum_inverse);
        assert_eq!(small.roi, large.roi);
        for (s, l) in small.legs.iter().zip(&large.legs) {
            assert!((l.stake - s.stake * 10.0).abs() <= 0.1);
        }
        assert!((large.profit - small.profit * 10.0).abs() < 1.0);
    }

    #[test]
    fn evaluation_is_deterministic() {
        let first = calculate_surebet(&three_way(), 777.0, 0.0);
        let second = calculate_surebet(&three_way(), 777.0, 0.0);

        assert_eq!(first, second);
        assert_eq!(first.profit.to_bits(), second.profit.to_bits());
    }

    #[test]
    fn exact_rounding_keeps_theoretical_profit() {
        let options = EngineOptions {
            rounding: RoundingMode::Exact,
            ..EngineOptions::default()
        };
        let result = evaluate(&three_way(), 1000.0, 0.0, &options);

        assert!(result.is_arb);
        assert!((result.total_stake() - 1000.0).abs() < 1e-6);
        assert!((result.profit - 1000.0 * result.roi).abs() < 1e-6);
    }

    #[test]
    fn flat_commission_uses_net_odds() {
        let legs = vec![leg(OutcomeKey::Home, 2.2), leg(OutcomeKey::Away, 2.2)];
        let options = EngineOptions {
            commission: Commission::Flat(0.05),
            ..EngineOptions::default()
        };
        let result = evaluate(&legs, 100.0, 0.0, &options);

        assert!(result.is_arb);
        assert!((result.roi - 0.07).abs() < 1e-9);
        for computed in &result.legs {
            assert_eq!(computed.odd, 2.2);
            assert!((computed.net_odd - 2.14).abs() < 1e-12);
            assert_eq!(computed.commission, 0.05);
            assert_eq!(computed.stake, 50.0);
        }
        assert!((result.profit - 7.0).abs() < 1e-9);
    }

    #[test]
    fn commission_can_remove_an_arbitrage() {
        let legs = vec![leg(OutcomeKey::Home, 2.05), leg(OutcomeKey::Away, 2.05)];
        assert!(calculate_surebet(&legs, 100.0, 0.0).is_arb);

        let options = EngineOptions {
            commission: Commission::Flat(0.05),
            ..EngineOptions::default()
        };
        assert!(!evaluate(&legs, 100.0, 0.0, &options).is_arb);
    }

    #[test]
    fn per_book_commission_only_hits_listed_books() {
        let legs = vec![
            Leg::new("exchange", "Exchange", OutcomeKey::Home, 2.2),
            Leg::new("sportsbook", "Sportsbook", OutcomeKey::Away, 2.2),
        ];
        let rates = HashMap::from([("exchange".to_string(), 0.05)]);
        let options = EngineOptions {
            commission: Commission::PerBook(rates),
            ..EngineOptions::default()
        };
        let result = evaluate(&legs, 100.0, 0.0, &options);

        assert!(result.is_arb);
        assert_eq!(result.legs[0].commission, 0.05);
        assert_eq!(result.legs[1].commission, 0.0);
        assert_eq!(result.legs[1].net_odd, 2.2);
    }

    #[test]
    fn zero_commission_is_bit_identical() {
        let options = EngineOptions {
            commission: Commission::Flat(0.0),
            ..EngineOptions::default()
        };
        assert_eq!(
            evaluate(&three_way(), 1000.0, 0.0, &options),
            calculate_surebet(&three_way(), 1000.0, 0.0)
        );
    }

    #[test]
    fn zero_investment_has_nothing_to_lock_in() {
        let legs = vec![leg(OutcomeKey::Home, 2.5), leg(OutcomeKey::Away, 2.5)];
        let result = calculate_surebet(&legs, 0.0, 0.0);

        assert!(!result.is_arb);
        assert_eq!(result.rejection, Some(Rejection::RoundingErased));
        assert!((result.roi - 0.25).abs() < EPS);
    }

    #[test]
    fn floor_rounding_truncates_at_requested_places() {
        assert_eq!(RoundingMode::default().apply(479.774_223_894_637_8), 479.77);
        assert_eq!(RoundingMode::Floor { decimals: 0 }.apply(12.99), 12.0);
        assert_eq!(RoundingMode::Exact.apply(12.345), 12.345);
    }

    #[test]
    fn result_serializes_camel_case() {
        let result = calculate_surebet(&three_way(), 1000.0, 0.0);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["isArb"], true);
        assert!(json["sumInverse"].is_number());
        assert_eq!(json["legs"][0]["outcomeKey"], "HOME");
        assert!(json["legs"][0]["impliedProb"].is_number());
        assert!(json.get("rejection").is_none());
    }
}
