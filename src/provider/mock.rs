//! In-memory odds source for tests and offline scans.
//!
//! Serves canned provider payloads without network access.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::{DashMap, DashSet};

use crate::error::ProviderError;

use super::client::OddsSource;
use super::types::OddsEvent;

/// Canned odds source keyed by sport.
#[derive(Debug, Clone, Default)]
pub struct FixtureSource {
    /// Events served per sport key.
    events: Arc<DashMap<String, Vec<OddsEvent>>>,
    /// Sports that answer with an error.
    failing: Arc<DashSet<String>>,
    /// Number of fetches served.
    calls: Arc<AtomicU64>,
}

impl FixtureSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load events from a provider JSON payload, grouped by their sport key.
    pub fn from_json(payload: &str) -> Result<Self, ProviderError> {
        let events: Vec<OddsEvent> =
            serde_json::from_str(payload).map_err(|e| ProviderError::Parse(e.to_string()))?;
        let source = Self::new();
        for event in events {
            source
                .events
                .entry(event.sport_key.clone())
                .or_default()
                .push(event);
        }
        Ok(source)
    }

    /// Replace the events served for a sport.
    pub fn set_events(&self, sport: &str, events: Vec<OddsEvent>) {
        self.events.insert(sport.to_string(), events);
    }

    /// Make a sport fail with a provider status error.
    pub fn fail_sport(&self, sport: &str) {
        self.failing.insert(sport.to_string());
    }

    /// Sports with canned events.
    pub fn sports(&self) -> Vec<String> {
        let mut sports: Vec<String> = self.events.iter().map(|e| e.key().clone()).collect();
        sports.sort();
        sports
    }

    /// Number of fetches served so far.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Clear all canned data.
    pub fn clear(&self) {
        self.events.clear();
        self.failing.clear();
    }
}

impl OddsSource for FixtureSource {
    async fn fetch_odds(&self, sport: &str) -> Result<Vec<OddsEvent>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.failing.contains(sport) {
            return Err(ProviderError::Status {
                sport: sport.to_string(),
                status: 503,
                body: "fixture failure".to_string(),
            });
        }

        Ok(self
            .events
            .get(sport)
            .map(|events| events.clone())
            .unwrap_or_default())
    }
}
