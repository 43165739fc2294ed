//! Prometheus metrics for scan throughput and provider access.
//!
//! This module provides metrics for:
//! - Events scanned and markets skipped
//! - Opportunities detected and rounding rejections
//! - Provider requests, failures and fetch latency
//! - Scan latency

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use tracing::debug;

// === Metric Name Constants ===

/// Scan latency metric name.
pub const METRIC_SCAN_LATENCY: &str = "scan_latency_ms";
/// Provider fetch latency metric name.
pub const METRIC_PROVIDER_FETCH_LATENCY: &str = "provider_fetch_latency_ms";
/// Events scanned counter metric name.
pub const METRIC_EVENTS_SCANNED: &str = "events_scanned_total";
/// Markets skipped counter metric name.
pub const METRIC_MARKETS_SKIPPED: &str = "markets_skipped_total";
/// Opportunities detected counter metric name.
pub const METRIC_OPPORTUNITIES_DETECTED: &str = "opportunities_detected_total";
/// Rounding rejections counter metric name.
pub const METRIC_ROUNDING_REJECTIONS: &str = "rounding_rejections_total";
/// Provider requests counter metric name.
pub const METRIC_PROVIDER_REQUESTS: &str = "provider_requests_total";
/// Provider failures counter metric name.
pub const METRIC_PROVIDER_FAILURES: &str = "provider_failures_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    // Latency histograms
    describe_histogram!(
        METRIC_SCAN_LATENCY,
        "Time to scan a batch of events in milliseconds"
    );
    describe_histogram!(
        METRIC_PROVIDER_FETCH_LATENCY,
        "Odds provider fetch latency in milliseconds"
    );

    // Counters
    describe_counter!(METRIC_EVENTS_SCANNED, "Total number of events scanned");
    describe_counter!(
        METRIC_MARKETS_SKIPPED,
        "Total number of markets skipped (unsupported or uncovered)"
    );
    describe_counter!(
        METRIC_OPPORTUNITIES_DETECTED,
        "Total number of surebets detected"
    );
    describe_counter!(
        METRIC_ROUNDING_REJECTIONS,
        "Total number of surebets erased by stake rounding"
    );
    describe_counter!(
        METRIC_PROVIDER_REQUESTS,
        "Total number of odds provider requests"
    );
    describe_counter!(
        METRIC_PROVIDER_FAILURES,
        "Total number of failed odds provider requests"
    );

    debug!("Metrics initialized");
}

/// Record provider fetch latency.
pub fn record_provider_fetch_latency(start: Instant, sport: &str) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_PROVIDER_FETCH_LATENCY, "sport" => sport.to_string()).record(latency_ms);
}

/// Increment events scanned counter.
pub fn inc_events_scanned() {
    counter!(METRIC_EVENTS_SCANNED).increment(1);
}

/// Add to the markets skipped counter.
pub fn add_markets_skipped(count: u64) {
    if count > 0 {
        counter!(METRIC_MARKETS_SKIPPED).increment(count);
    }
}

/// Increment opportunities detected counter.
pub fn inc_opportunities_detected() {
    counter!(METRIC_OPPORTUNITIES_DETECTED).increment(1);
}

/// Increment rounding rejections counter.
pub fn inc_rounding_rejections() {
    counter!(METRIC_ROUNDING_REJECTIONS).increment(1);
}

/// Increment provider requests counter.
pub fn inc_provider_requests(sport: &str) {
    counter!(METRIC_PROVIDER_REQUESTS, "sport" => sport.to_string()).increment(1);
}

/// Increment provider failures counter.
pub fn inc_provider_failures(sport: &str) {
    counter!(METRIC_PROVIDER_FAILURES, "sport" => sport.to_string()).increment(1);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric.
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        let latency_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        histogram!(self.metric_name).record(latency_ms);
    }
}

/// Create a latency timer for event scans.
pub fn timer_scan() -> LatencyTimer {
    LatencyTimer::new(METRIC_SCAN_LATENCY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn latency_timer_measures_time() {
        let timer = LatencyTimer::new("test_metric");
        sleep(Duration::from_millis(10));
        let elapsed = timer.elapsed_ms();
        assert!(elapsed >= 9.0);
    }

    #[test]
    fn helpers_are_safe_without_recorder() {
        inc_events_scanned();
        add_markets_skipped(0);
        add_markets_skipped(3);
        inc_provider_requests("soccer_epl");
        record_provider_fetch_latency(Instant::now(), "soccer_epl");
        drop(timer_scan());
    }
}
