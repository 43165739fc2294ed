//! The Odds API client.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, instrument, warn};

use crate::config::Config;
use crate::error::ProviderError;
use crate::metrics;
use crate::utils::truncate;

use super::budget::DailyBudget;
use super::types::OddsEvent;

/// Header carrying the provider's remaining monthly quota.
const REMAINING_HEADER: &str = "x-requests-remaining";

/// Anything that can produce provider events for a sport.
pub trait OddsSource: Send + Sync {
    /// Fetch the current events and odds for a sport key.
    fn fetch_odds(
        &self,
        sport: &str,
    ) -> impl Future<Output = Result<Vec<OddsEvent>, ProviderError>> + Send;
}

/// HTTP client for The Odds API v4.
#[derive(Debug, Clone)]
pub struct OddsApiClient {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// Base URL, without trailing slash.
    base_url: String,
    /// API key.
    api_key: String,
    /// Bookmaker regions.
    regions: String,
    /// Market keys.
    markets: String,
    /// Shared request budget.
    budget: Arc<DailyBudget>,
}

impl OddsApiClient {
    /// Create a client from config. Fails without an API key.
    pub fn new(config: &Config) -> Result<Self, ProviderError> {
        let api_key = config
            .odds_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ProviderError::MissingApiKey)?
            .to_string();

        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.http_timeout_ms))
            .connect_timeout(Duration::from_secs(5))
            .tcp_keepalive(Duration::from_secs(30))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            http,
            base_url: config.odds_api_url.trim_end_matches('/').to_string(),
            api_key,
            regions: config.regions.clone(),
            markets: config.markets.clone(),
            budget: Arc::new(DailyBudget::new(config.daily_request_limit)),
        })
    }

    /// Share an existing budget instead of the client's own.
    pub fn with_budget(mut self, budget: Arc<DailyBudget>) -> Self {
        self.budget = budget;
        self
    }

    /// Request budget consulted before each call.
    pub fn budget(&self) -> &Arc<DailyBudget> {
        &self.budget
    }

    /// Odds endpoint for a sport.
    pub fn odds_url(&self, sport: &str) -> String {
        format!("{}/sports/{}/odds", self.base_url, sport)
    }

    #[instrument(skip(self), fields(sport = %sport))]
    async fn fetch(&self, sport: &str) -> Result<Vec<OddsEvent>, ProviderError> {
        let remaining_budget = self.budget.try_acquire(sport)?;
        metrics::inc_provider_requests(sport);
        let start = Instant::now();

        let response = self
            .http
            .get(self.odds_url(sport))
            .query(&[
                ("apiKey", self.api_key.as_str()),
                ("regions", self.regions.as_str()),
                ("markets", self.markets.as_str()),
                ("oddsFormat", "decimal"),
            ])
            .send()
            .await?;

        metrics::record_provider_fetch_latency(start, sport);

        if let Some(remaining) = response
            .headers()
            .get(REMAINING_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            debug!(provider_remaining = %remaining, remaining_budget, "Provider quota");
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                sport: sport.to_string(),
                status: status.as_u16(),
                body: truncate(&body, 200),
            });
        }

        let body = response.text().await?;
        let events: Vec<OddsEvent> =
            serde_json::from_str(&body).map_err(|e| ProviderError::Parse(e.to_string()))?;

        debug!(events = events.len(), "Fetched odds");
        Ok(events)
    }
}

impl OddsSource for OddsApiClient {
    async fn fetch_odds(&self, sport: &str) -> Result<Vec<OddsEvent>, ProviderError> {
        let result = self.fetch(sport).await;
        if let Err(e) = &result {
            metrics::inc_provider_failures(sport);
            warn!(sport = %sport, error = %e, "Odds fetch failed");
        }
        result
    }
}
