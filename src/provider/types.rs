//! Provider odds payload (The Odds API v4 shape).

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::market::RawOutcome;

/// One sporting event with every bookmaker's markets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OddsEvent {
    /// Provider event id.
    pub id: String,
    /// Sport key (e.g. `soccer_epl`).
    #[serde(default)]
    pub sport_key: String,
    /// Human sport title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sport_title: Option<String>,
    /// Kick-off time.
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>)]
    pub commence_time: Option<OffsetDateTime>,
    /// Home team name.
    #[serde(default)]
    pub home_team: String,
    /// Away team name.
    #[serde(default)]
    pub away_team: String,
    /// Bookmaker offers.
    #[serde(default)]
    pub bookmakers: Vec<Bookmaker>,
}

/// Markets offered by one bookmaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Bookmaker {
    /// Bookmaker id.
    pub key: String,
    /// Display name.
    #[serde(default)]
    pub title: String,
    /// Markets.
    #[serde(default)]
    pub markets: Vec<ProviderMarket>,
}

impl Bookmaker {
    /// Display name, falling back to the key.
    pub fn display_name(&self) -> &str {
        if self.title.is_empty() {
            &self.key
        } else {
            &self.title
        }
    }
}

/// One market as quoted by one bookmaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProviderMarket {
    /// Provider market key (`h2h`, `totals`, ...).
    pub key: String,
    /// Quoted outcomes.
    #[serde(default)]
    pub outcomes: Vec<RawOutcome>,
}
