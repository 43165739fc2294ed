//! Surebet detection over provider events.
//!
//! Per event: normalize every bookmaker market, group comparable markets,
//! keep the best price per outcome, gate on coverage, then evaluate.

use serde::Serialize;
use time::OffsetDateTime;
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

use super::calculator::{evaluate, net_odd, ArbResult, EngineOptions, Leg, Rejection};
use super::selection::select_best_prices_by;
use crate::market::{
    normalize, normalize_outcome_key_with, validate_coverage, FamilyKind, NormalizedMarket,
    OutcomeSynonyms, Period,
};
use crate::metrics;
use crate::provider::OddsEvent;

/// Inputs shared by every evaluation in a scan.
#[derive(Debug, Clone)]
pub struct ScanSettings {
    /// Amount split across the legs of each opportunity.
    pub total_investment: f64,
    /// Minimum theoretical ROI to allocate stakes.
    pub min_roi: f64,
    /// Engine tuning.
    pub engine: EngineOptions,
    /// Outcome label synonyms.
    pub synonyms: OutcomeSynonyms,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            total_investment: 1000.0,
            min_roi: 0.0,
            engine: EngineOptions::default(),
            synonyms: OutcomeSynonyms::default(),
        }
    }
}

/// Detected surebet on one market of one event.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Opportunity {
    /// Provider event id.
    pub event_id: String,
    /// Sport key.
    pub sport_key: String,
    /// Home team.
    pub home_team: String,
    /// Away team.
    pub away_team: String,
    /// Kick-off time.
    #[serde(with = "time::serde::rfc3339::option")]
    #[schema(value_type = Option<String>)]
    pub commence_time: Option<OffsetDateTime>,
    /// Market the legs belong to.
    pub market: NormalizedMarket,
    /// Engine output with stakes.
    pub result: ArbResult,
    /// When the scan found it.
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String)]
    pub detected_at: OffsetDateTime,
}

/// Outcome of scanning one or more events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct ScanReport {
    /// Events looked at.
    pub events_scanned: usize,
    /// Market groups that reached the engine.
    pub markets_evaluated: usize,
    /// Bookmaker markets or groups dropped before the engine.
    pub markets_skipped: usize,
    /// Groups whose edge vanished after stake truncation.
    pub rounding_rejections: usize,
    /// Best theoretical ROI among evaluated groups.
    pub best_roi: Option<f64>,
    /// Profitable, executable opportunities.
    pub opportunities: Vec<Opportunity>,
}

impl ScanReport {
    /// Fold another report into this one.
    pub fn merge(&mut self, other: ScanReport) {
        self.events_scanned += other.events_scanned;
        self.markets_evaluated += other.markets_evaluated;
        self.markets_skipped += other.markets_skipped;
        self.rounding_rejections += other.rounding_rejections;
        self.best_roi = max_roi(self.best_roi, other.best_roi);
        self.opportunities.extend(other.opportunities);
    }
}

fn max_roi(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, None) => x,
        (None, y) => y,
    }
}

/// Markets are only combined when family, period and line all match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MarketGroupKey {
    kind: FamilyKind,
    period: Period,
    line_bits: Option<u64>,
}

impl MarketGroupKey {
    fn of(market: &NormalizedMarket) -> Self {
        Self {
            kind: market.family.kind(),
            period: market.period,
            line_bits: market.line().map(f64::to_bits),
        }
    }
}

struct MarketGroup {
    key: MarketGroupKey,
    market: NormalizedMarket,
    legs: Vec<Leg>,
}

/// Collect candidate legs from every bookmaker, grouped by comparable market.
fn collect_groups(event: &OddsEvent, synonyms: &OutcomeSynonyms) -> (Vec<MarketGroup>, usize) {
    let mut groups: Vec<MarketGroup> = Vec::new();
    let mut skipped = 0;

    for book in &event.bookmakers {
        for provider_market in &book.markets {
            let Some(market) = normalize(&provider_market.key, &provider_market.outcomes) else {
                debug!(
                    book = %book.key,
                    market = %provider_market.key,
                    "Unsupported market skipped"
                );
                skipped += 1;
                continue;
            };

            let key = MarketGroupKey::of(&market);
            let line = market.line();
            let required = market.outcomes.clone();

            let idx = match groups.iter().position(|g| g.key == key) {
                Some(idx) => idx,
                None => {
                    groups.push(MarketGroup {
                        key,
                        market,
                        legs: Vec::new(),
                    });
                    groups.len() - 1
                }
            };

            for outcome in &provider_market.outcomes {
                // an outcome quoted on another line is a different market
                if line.is_some() && outcome.point.is_some() && outcome.point != line {
                    continue;
                }
                let outcome_key = normalize_outcome_key_with(
                    &outcome.name,
                    &event.home_team,
                    &event.away_team,
                    synonyms,
                );
                if !required.contains(&outcome_key) {
                    continue;
                }
                groups[idx].legs.push(Leg::new(
                    book.key.clone(),
                    book.display_name(),
                    outcome_key,
                    outcome.price,
                ));
            }
        }
    }

    (groups, skipped)
}

/// Scan one event for surebets.
#[instrument(skip(event, settings), fields(event = %event.id, sport = %event.sport_key))]
pub fn scan_event(event: &OddsEvent, settings: &ScanSettings) -> ScanReport {
    let (groups, skipped) = collect_groups(event, &settings.synonyms);
    let mut report = ScanReport {
        events_scanned: 1,
        markets_skipped: skipped,
        ..ScanReport::default()
    };
    metrics::inc_events_scanned();

    for group in groups {
        let label = group.market.label();
        // rank on what the engine will actually price
        let commission = &settings.engine.commission;
        let selected = select_best_prices_by(group.legs, |leg| {
            net_odd(leg.odd, commission.rate_for(&leg.book_id))
        });

        if !validate_coverage(
            group.key.kind,
            selected.iter().map(|leg| leg.outcome_key.as_str()),
        ) {
            debug!(market = %label, priced = selected.len(), "Incomplete coverage, skipped");
            report.markets_skipped += 1;
            continue;
        }

        let mut ordered = selected;
        let required = group.market.outcomes.as_slice();
        ordered.sort_by_key(|leg| required.iter().position(|k| *k == leg.outcome_key));

        let result = evaluate(
            &ordered,
            settings.total_investment,
            settings.min_roi,
            &settings.engine,
        );
        report.markets_evaluated += 1;
        report.best_roi = max_roi(report.best_roi, Some(result.roi));

        if result.is_arb {
            info!(
                market = %label,
                roi_pct = result.roi_pct(),
                profit = result.profit,
                sum_inverse = result.sum_inverse,
                "Surebet detected"
            );
            metrics::inc_opportunities_detected();
            report.opportunities.push(Opportunity {
                event_id: event.id.clone(),
                sport_key: event.sport_key.clone(),
                home_team: event.home_team.clone(),
                away_team: event.away_team.clone(),
                commence_time: event.commence_time,
                market: group.market,
                result,
                detected_at: OffsetDateTime::now_utc(),
            });
        } else if result.rejection == Some(Rejection::RoundingErased) {
            debug!(
                market = %label,
                roi_pct = result.roi_pct(),
                profit = result.profit,
                "Edge erased by stake rounding"
            );
            metrics::inc_rounding_rejections();
            report.rounding_rejections += 1;
        } else {
            debug!(
                market = %label,
                sum_inverse = result.sum_inverse,
                roi_pct = result.roi_pct(),
                "No surebet"
            );
        }
    }

    metrics::add_markets_skipped(report.markets_skipped as u64);
    report
}

/// Scan a batch of events.
pub fn scan_events(events: &[OddsEvent], settings: &ScanSettings) -> ScanReport {
    let _timer = metrics::timer_scan();
    events
        .iter()
        .map(|event| scan_event(event, settings))
        .fold(ScanReport::default(), |mut acc, report| {
            acc.merge(report);
            acc
        })
}
