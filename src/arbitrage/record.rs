//! Storage/display mapping of detected opportunities.
//!
//! The engine works in f64; records carry money as `Decimal` truncated to
//! cents so persisted amounts never exceed what the engine planned.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use time::OffsetDateTime;
use utoipa::ToSchema;

use super::detector::Opportunity;
use crate::market::{FamilyKind, OutcomeKey, Period};

/// One leg of a stored opportunity.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RecordLeg {
    /// Bookmaker id.
    pub book_id: String,
    /// Bookmaker display name.
    pub book_name: String,
    /// Outcome.
    pub outcome_key: OutcomeKey,
    /// Quoted odd.
    #[schema(value_type = String)]
    pub odd: Decimal,
    /// Stake to place.
    #[schema(value_type = String)]
    pub stake: Decimal,
    /// Payout if this outcome wins.
    #[schema(value_type = String)]
    pub payout: Decimal,
}

/// Flattened opportunity as handed to storage and the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct OpportunityRecord {
    /// Stable id: `{event_id}:{market label}`.
    pub id: String,
    /// Provider event id.
    pub event_id: String,
    /// Sport key.
    pub sport_key: String,
    /// `Home vs Away`.
    pub matchup: String,
    /// Market family.
    pub family: FamilyKind,
    /// Market period.
    pub period: Period,
    /// Totals line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<f64>,
    /// ROI in percent, two decimals.
    #[schema(value_type = String)]
    pub roi_pct: Decimal,
    /// Guaranteed profit.
    #[schema(value_type = String)]
    pub profit: Decimal,
    /// Sum of stakes.
    #[schema(value_type = String)]
    pub total_stake: Decimal,
    /// Legs.
    pub legs: Vec<RecordLeg>,
    /// Kick-off time.
    #[serde(with = "time::serde::rfc3339::option")]
    #[schema(value_type = Option<String>)]
    pub commence_time: Option<OffsetDateTime>,
    /// Detection time.
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String)]
    pub detected_at: OffsetDateTime,
}

/// Truncate to cents.
fn money(value: f64) -> Decimal {
    Decimal::from_f64(value)
        .unwrap_or_default()
        .round_dp_with_strategy(2, RoundingStrategy::ToZero)
}

fn odd(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default().round_dp(3)
}

impl From<&Opportunity> for OpportunityRecord {
    fn from(opp: &Opportunity) -> Self {
        let legs: Vec<RecordLeg> = opp
            .result
            .legs
            .iter()
            .map(|leg| RecordLeg {
                book_id: leg.book_id.clone(),
                book_name: leg.book_name.clone(),
                outcome_key: leg.outcome_key,
                odd: odd(leg.odd),
                stake: money(leg.stake),
                payout: money(leg.payout),
            })
            .collect();
        let total_stake: Decimal = legs.iter().map(|l| l.stake).sum();

        Self {
            id: format!("{}:{}", opp.event_id, opp.market.label()),
            event_id: opp.event_id.clone(),
            sport_key: opp.sport_key.clone(),
            matchup: format!("{} vs {}", opp.home_team, opp.away_team),
            family: opp.market.family.kind(),
            period: opp.market.period,
            line: opp.market.line(),
            roi_pct: Decimal::from_f64(opp.result.roi_pct())
                .unwrap_or_default()
                .round_dp(2),
            profit: money(opp.result.profit),
            total_stake,
            legs,
            commence_time: opp.commence_time,
            detected_at: opp.detected_at,
        }
    }
}
