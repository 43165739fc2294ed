//! End-to-end tests for the surebet scanner.
//!
//! Most tests run the full pipeline over a saved provider payload.
//! The live test needs ODDS_API_KEY and spends one provider request.
//! Run it with: cargo test --test integration -- --ignored

use axum::body::Body;
use axum::http::{Request, StatusCode};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tower::ServiceExt;

use surebet_scanner::api::{create_router, AppState};
use surebet_scanner::arbitrage::{
    scan_events, Commission, EngineOptions, OpportunityRecord, ScanSettings,
};
use surebet_scanner::config::Config;
use surebet_scanner::market::{FamilyKind, OutcomeKey};
use surebet_scanner::poller::run_cycle;
use surebet_scanner::provider::{FixtureSource, OddsApiClient, OddsEvent, OddsSource};

const SNAPSHOT: &str = include_str!("../fixtures/odds_snapshot.json");

fn events() -> Vec<OddsEvent> {
    serde_json::from_str(SNAPSHOT).expect("fixture parses")
}

fn sports() -> Vec<String> {
    vec![
        "soccer_epl".to_string(),
        "soccer_brazil_campeonato".to_string(),
    ]
}

#[test]
fn snapshot_scan_counts() {
    let report = scan_events(&events(), &ScanSettings::default());

    assert_eq!(report.events_scanned, 3);
    // three-way + totals 2.5 for Arsenal, three-way for Spurs, totals for Flamengo
    assert_eq!(report.markets_evaluated, 4);
    // spreads market and the one-sided 3.5 line
    assert_eq!(report.markets_skipped, 2);
    assert_eq!(report.rounding_rejections, 0);
    assert_eq!(report.opportunities.len(), 3);

    let best = report.best_roi.expect("evaluated markets");
    assert!((best - 0.047619).abs() < 1e-6);
}

#[test]
fn every_opportunity_is_profitable_and_covered() {
    let report = scan_events(&events(), &ScanSettings::default());

    for opp in &report.opportunities {
        let result = &opp.result;
        assert!(result.is_arb);
        assert!(result.sum_inverse < 0.999999);
        assert!(result.profit > 0.0);
        assert!(result.total_stake() <= 1000.0);

        let keys: Vec<OutcomeKey> = result.legs.iter().map(|l| l.outcome_key).collect();
        assert_eq!(keys, opp.market.outcomes);

        for leg in &result.legs {
            assert!(leg.payout >= result.total_stake());
            let cents = leg.stake * 100.0;
            assert!((cents - cents.round()).abs() < 1e-6, "stake {}", leg.stake);
        }
    }
}

#[test]
fn best_prices_come_from_different_books() {
    let report = scan_events(&events(), &ScanSettings::default());
    let three_way = report
        .opportunities
        .iter()
        .find(|o| o.market.family.kind() == FamilyKind::ThreeWay)
        .expect("three-way surebet");

    let books: Vec<&str> = three_way
        .result
        .legs
        .iter()
        .map(|l| l.book_id.as_str())
        .collect();
    assert_eq!(books, vec!["book_a", "book_b", "book_c"]);

    let stakes: Vec<f64> = three_way.result.legs.iter().map(|l| l.stake).collect();
    assert_eq!(stakes, vec![479.77, 296.33, 223.89]);
}

#[test]
fn min_roi_filters_thin_edges() {
    let settings = ScanSettings {
        min_roi: 0.04,
        ..ScanSettings::default()
    };

    let report = scan_events(&events(), &settings);

    assert_eq!(report.opportunities.len(), 1);
    assert_eq!(report.opportunities[0].event_id, "evt-fla-pal");
}

#[test]
fn commission_removes_the_three_way_edge() {
    let settings = ScanSettings {
        engine: EngineOptions {
            commission: Commission::Flat(0.05),
            ..EngineOptions::default()
        },
        ..ScanSettings::default()
    };

    let report = scan_events(&events(), &settings);

    assert_eq!(report.opportunities.len(), 2);
    assert!(report
        .opportunities
        .iter()
        .all(|o| o.market.family.kind() == FamilyKind::Totals));
}

#[tokio::test]
async fn poll_cycle_feeds_the_api() {
    let source = FixtureSource::from_json(SNAPSHOT).expect("fixture parses");
    let state = AppState::new(ScanSettings::default());

    let summary = run_cycle(&source, &sports(), &state.settings, &state.board).await;
    state.stats.write().await.record_cycle(&summary);
    state.set_ready(true);

    let app = create_router(state);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/opportunities")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let records: Vec<serde_json::Value> = serde_json::from_slice(&bytes).unwrap();

    let ids: Vec<&str> = records.iter().map(|r| r["id"].as_str().unwrap()).collect();
    assert_eq!(
        ids,
        vec![
            "evt-fla-pal:totals 2.5 full_time",
            "evt-ars-che:totals 2.5 full_time",
            "evt-ars-che:three-way full_time",
        ]
    );
    assert_eq!(records[0]["roi_pct"], "4.76");
}

#[test]
fn records_truncate_money() {
    let report = scan_events(&events(), &ScanSettings::default());
    let records: Vec<OpportunityRecord> = report
        .opportunities
        .iter()
        .map(OpportunityRecord::from)
        .collect();

    let totals = records
        .iter()
        .find(|r| r.event_id == "evt-ars-che" && r.family == FamilyKind::Totals)
        .expect("totals record");

    assert_eq!(totals.line, Some(2.5));
    assert_eq!(totals.roi_pct, dec!(3.73));
    assert_eq!(totals.total_stake, dec!(999.99));
    let stakes: Vec<Decimal> = totals.legs.iter().map(|l| l.stake).collect();
    assert_eq!(stakes, vec![dec!(493.97), dec!(506.02)]);
}

/// Live fetch against The Odds API.
#[tokio::test]
#[ignore = "requires ODDS_API_KEY"]
async fn live_fetch_and_scan() {
    dotenvy::dotenv().ok();
    let config = Config {
        odds_api_key: std::env::var("ODDS_API_KEY").ok(),
        daily_request_limit: 1,
        ..Config::default()
    };
    let client = match OddsApiClient::new(&config) {
        Ok(c) => c,
        Err(_) => {
            println!("Skipping: ODDS_API_KEY not set");
            return;
        }
    };

    let events = client
        .fetch_odds("soccer_epl")
        .await
        .expect("provider answers");
    let report = scan_events(&events, &config.scan_settings());

    println!(
        "events={} evaluated={} skipped={} opportunities={}",
        report.events_scanned,
        report.markets_evaluated,
        report.markets_skipped,
        report.opportunities.len()
    );
    assert_eq!(report.events_scanned, events.len());
}
