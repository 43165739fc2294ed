//! HTTP API handlers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;
use utoipa::ToSchema;

use crate::arbitrage::{
    evaluate, scan_events, ArbResult, Leg, OpportunityRecord, ScanReport, ScanSettings,
};
use crate::poller::ScanStats;
use crate::provider::OddsEvent;
use crate::store::OpportunityBoard;

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Whether the poll loop finished at least one cycle.
    pub ready: Arc<AtomicBool>,
    /// Poll statistics.
    pub stats: Arc<RwLock<ScanStats>>,
    /// Latest opportunities.
    pub board: Arc<OpportunityBoard>,
    /// Configured scan inputs, used by the calculate and scan endpoints.
    pub settings: Arc<ScanSettings>,
    /// Prometheus handle when a recorder is installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new app state.
    pub fn new(settings: ScanSettings) -> Self {
        Self {
            ready: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(RwLock::new(ScanStats::default())),
            board: Arc::new(OpportunityBoard::new()),
            settings: Arc::new(settings),
            prometheus: None,
        }
    }

    /// Attach a Prometheus handle for `/metrics`.
    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }

    /// Set ready state.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Check if ready.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ScanSettings::default())
    }
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: String,
}

/// Readiness check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Whether a poll cycle has completed.
    pub ready: bool,
}

/// Status response.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    /// Service status.
    pub status: String,
    /// Opportunities currently on the board.
    pub open_opportunities: usize,
    /// Poll statistics.
    pub stats: ScanStats,
}

/// Calculator request.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalculateRequest {
    /// One leg per outcome.
    pub legs: Vec<Leg>,
    /// Amount to split.
    #[serde(alias = "total_investment")]
    pub total_investment: f64,
    /// Minimum ROI; defaults to the configured value.
    #[serde(default, alias = "min_roi")]
    pub min_roi: Option<f64>,
}

/// Offline scan request.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    /// Provider events to scan.
    pub events: Vec<OddsEvent>,
    /// Amount to split; defaults to the configured value.
    #[serde(default, alias = "total_investment")]
    pub total_investment: Option<f64>,
    /// Minimum ROI; defaults to the configured value.
    #[serde(default, alias = "min_roi")]
    pub min_roi: Option<f64>,
}

/// Health check handler - always returns 200.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Service is alive", body = HealthResponse))
)]
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness check handler - returns 200 if ready, 503 otherwise.
#[utoipa::path(
    get,
    path = "/ready",
    tag = "health",
    responses(
        (status = 200, description = "First poll cycle completed", body = ReadyResponse),
        (status = 503, description = "Still starting", body = ReadyResponse)
    )
)]
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.is_ready();
    let code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(ReadyResponse { ready }))
}

/// Status handler - returns poll statistics.
#[utoipa::path(
    get,
    path = "/api/v1/status",
    tag = "scanner",
    responses((status = 200, description = "Poll statistics", body = StatusResponse))
)]
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.stats.read().await.clone();
    let status = if state.is_ready() { "running" } else { "starting" };

    Json(StatusResponse {
        status: status.to_string(),
        open_opportunities: state.board.len(),
        stats,
    })
}

/// Current opportunities, best ROI first.
#[utoipa::path(
    get,
    path = "/api/v1/opportunities",
    tag = "scanner",
    responses((status = 200, description = "Latest opportunities", body = [OpportunityRecord]))
)]
pub async fn opportunities(State(state): State<AppState>) -> Json<Vec<OpportunityRecord>> {
    Json(state.board.snapshot())
}

/// Run the engine on caller-supplied legs.
#[utoipa::path(
    post,
    path = "/api/v1/calculate",
    tag = "engine",
    request_body = CalculateRequest,
    responses((status = 200, description = "Evaluation result", body = ArbResult))
)]
pub async fn calculate(
    State(state): State<AppState>,
    Json(request): Json<CalculateRequest>,
) -> Json<ArbResult> {
    let min_roi = request.min_roi.unwrap_or(state.settings.min_roi);
    let result = evaluate(
        &request.legs,
        request.total_investment,
        min_roi,
        &state.settings.engine,
    );
    debug!(
        legs = request.legs.len(),
        is_arb = result.is_arb,
        roi = result.roi,
        "Calculator request"
    );
    Json(result)
}

/// Scan caller-supplied provider events.
#[utoipa::path(
    post,
    path = "/api/v1/scan",
    tag = "engine",
    request_body = ScanRequest,
    responses((status = 200, description = "Scan report", body = ScanReport))
)]
pub async fn scan(
    State(state): State<AppState>,
    Json(request): Json<ScanRequest>,
) -> Json<ScanReport> {
    let mut settings = (*state.settings).clone();
    if let Some(total_investment) = request.total_investment {
        settings.total_investment = total_investment;
    }
    if let Some(min_roi) = request.min_roi {
        settings.min_roi = min_roi;
    }
    Json(scan_events(&request.events, &settings))
}

/// Prometheus text exposition.
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "health",
    responses(
        (status = 200, description = "Prometheus metrics", body = String),
        (status = 404, description = "No recorder installed")
    )
)]
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.prometheus {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed".to_string()),
    }
}
