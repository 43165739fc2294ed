//! Periodic fetch-and-scan loop.

use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::api::AppState;
use crate::arbitrage::{scan_events, OpportunityRecord, ScanReport, ScanSettings};
use crate::provider::OddsSource;
use crate::store::OpportunityBoard;

/// Running totals across poll cycles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct ScanStats {
    /// Completed cycles.
    pub cycles: u64,
    /// Events scanned.
    pub events_scanned: u64,
    /// Market groups evaluated by the engine.
    pub markets_evaluated: u64,
    /// Markets dropped before the engine.
    pub markets_skipped: u64,
    /// Surebets erased by stake rounding.
    pub rounding_rejections: u64,
    /// Surebets detected.
    pub opportunities_found: u64,
    /// Failed provider fetches.
    pub provider_failures: u64,
    /// Best theoretical ROI seen in the last cycle.
    pub last_best_roi: Option<f64>,
    /// When the last cycle finished.
    #[serde(with = "time::serde::rfc3339::option")]
    #[schema(value_type = Option<String>)]
    pub last_cycle_at: Option<OffsetDateTime>,
}

impl ScanStats {
    /// Fold a finished cycle into the totals.
    pub fn record_cycle(&mut self, summary: &CycleSummary) {
        self.cycles += 1;
        self.events_scanned += summary.report.events_scanned as u64;
        self.markets_evaluated += summary.report.markets_evaluated as u64;
        self.markets_skipped += summary.report.markets_skipped as u64;
        self.rounding_rejections += summary.report.rounding_rejections as u64;
        self.opportunities_found += summary.report.opportunities.len() as u64;
        self.provider_failures += summary.failed_sports.len() as u64;
        self.last_best_roi = summary.report.best_roi;
        self.last_cycle_at = Some(summary.finished_at);
    }
}

/// Result of one pass over every sport.
#[derive(Debug, Clone)]
pub struct CycleSummary {
    /// Combined scan report of the sports that answered.
    pub report: ScanReport,
    /// Sports whose fetch failed; their board entries are left untouched.
    pub failed_sports: Vec<String>,
    /// Completion time.
    pub finished_at: OffsetDateTime,
}

/// Fetch every sport concurrently, scan, and publish to the board.
#[instrument(skip_all, fields(sports = sports.len()))]
pub async fn run_cycle<S: OddsSource>(
    source: &S,
    sports: &[String],
    settings: &ScanSettings,
    board: &OpportunityBoard,
) -> CycleSummary {
    let fetches = sports.iter().map(|sport| async move {
        let result = source.fetch_odds(sport).await;
        (sport, result)
    });

    let mut report = ScanReport::default();
    let mut failed_sports = Vec::new();

    for (sport, result) in join_all(fetches).await {
        match result {
            Ok(events) => {
                let sport_report = scan_events(&events, settings);
                let records: Vec<OpportunityRecord> = sport_report
                    .opportunities
                    .iter()
                    .map(OpportunityRecord::from)
                    .collect();
                board.replace_sport(sport, records);
                report.merge(sport_report);
            }
            Err(e) => {
                warn!(sport = %sport, error = %e, "Sport skipped this cycle");
                failed_sports.push(sport.clone());
            }
        }
    }

    info!(
        events = report.events_scanned,
        evaluated = report.markets_evaluated,
        skipped = report.markets_skipped,
        opportunities = report.opportunities.len(),
        failed = failed_sports.len(),
        "Poll cycle complete"
    );

    CycleSummary {
        report,
        failed_sports,
        finished_at: OffsetDateTime::now_utc(),
    }
}

/// Poll until `shutdown` resolves, updating shared state after each cycle.
///
/// With `max_age` set, board entries detected longer ago than that are
/// dropped after every cycle, including those of sports whose fetch failed.
pub async fn poll_loop<S, F>(
    source: S,
    sports: Vec<String>,
    settings: ScanSettings,
    state: AppState,
    interval: Duration,
    max_age: Option<Duration>,
    shutdown: F,
) where
    S: OddsSource,
    F: std::future::Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Poll loop stopping");
                break;
            }
            _ = ticker.tick() => {
                let summary = run_cycle(&source, &sports, &settings, &state.board).await;
                if let Some(max_age) = max_age {
                    let expired = state.board.expire_before(summary.finished_at - max_age);
                    if expired > 0 {
                        info!(expired, "Stale opportunities dropped");
                    }
                }
                state.stats.write().await.record_cycle(&summary);
                state.set_ready(true);
            }
        }
    }
}
