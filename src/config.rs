//! Application configuration loaded from environment variables.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::arbitrage::{
    Commission, EngineOptions, RoundingMode, ScanSettings, DEFAULT_ARB_THRESHOLD,
    DEFAULT_STAKE_DECIMALS,
};
use crate::error::ConfigError;
use crate::market::OutcomeSynonyms;

/// Log directives used when verbose logging is on.
pub const VERBOSE_LOG_FILTER: &str = "surebet_scanner=debug,info";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Odds Provider ===
    /// The Odds API key. Required for live polling only.
    #[serde(default)]
    pub odds_api_key: Option<String>,

    /// Provider base URL.
    #[serde(default = "default_odds_api_url")]
    pub odds_api_url: String,

    /// Sport keys to poll (comma-separated).
    #[serde(default = "default_sports")]
    pub sports: Vec<String>,

    /// Bookmaker regions requested from the provider.
    #[serde(default = "default_regions")]
    pub regions: String,

    /// Provider market keys requested.
    #[serde(default = "default_markets")]
    pub markets: String,

    /// Maximum provider requests per sport per UTC day.
    #[serde(default = "default_daily_request_limit")]
    pub daily_request_limit: u32,

    /// Seconds between poll cycles.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,

    /// Board entries older than this many seconds are dropped (0 keeps them).
    #[serde(default = "default_opportunity_ttl")]
    pub opportunity_ttl_seconds: u64,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,

    // === Engine Parameters ===
    /// Amount split across the legs of each opportunity.
    #[serde(default = "default_total_investment")]
    pub total_investment: f64,

    /// Minimum theoretical ROI (fraction, 0.01 = 1%).
    #[serde(default)]
    pub min_roi: f64,

    /// Sum of inverses must be strictly below this.
    #[serde(default = "default_arb_threshold")]
    pub arb_threshold: f64,

    /// Decimal places stakes are floored to.
    #[serde(default = "default_stake_decimals")]
    pub stake_decimals: u32,

    /// Floor stakes (false keeps raw stakes).
    #[serde(default = "default_true")]
    pub round_stakes: bool,

    /// Commission on winnings applied to every bookmaker.
    #[serde(default)]
    pub commission: f64,

    /// Per-bookmaker commission, `book=rate` entries. Unlisted books pay none.
    #[serde(default)]
    pub book_commissions: Vec<String>,

    // === Outcome Synonyms ===
    /// Extra substrings meaning "over".
    #[serde(default)]
    pub over_synonyms: Vec<String>,

    /// Extra substrings meaning "under".
    #[serde(default)]
    pub under_synonyms: Vec<String>,

    // === Server Configuration ===
    /// HTTP server port for the API.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,
}

fn default_odds_api_url() -> String {
    "https://api.the-odds-api.com/v4".to_string()
}

fn default_sports() -> Vec<String> {
    vec!["soccer_epl".to_string()]
}

fn default_regions() -> String {
    "eu".to_string()
}

fn default_markets() -> String {
    "h2h,totals".to_string()
}

fn default_daily_request_limit() -> u32 {
    500
}

fn default_poll_interval() -> u64 {
    300
}

fn default_opportunity_ttl() -> u64 {
    900
}

fn default_http_timeout_ms() -> u64 {
    10_000
}

fn default_total_investment() -> f64 {
    1000.0
}

fn default_arb_threshold() -> f64 {
    DEFAULT_ARB_THRESHOLD
}

fn default_stake_decimals() -> u32 {
    DEFAULT_STAKE_DECIMALS
}

fn default_true() -> bool {
    true
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn valid_rate(rate: f64) -> bool {
    (0.0..1.0).contains(&rate)
}

fn parse_book_commission(entry: &str) -> Option<(String, f64)> {
    let (book, rate) = entry.split_once('=')?;
    let book = book.trim();
    let rate: f64 = rate.trim().parse().ok()?;
    if book.is_empty() || !valid_rate(rate) {
        return None;
    }
    Some((book.to_string(), rate))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            odds_api_key: None,
            odds_api_url: default_odds_api_url(),
            sports: default_sports(),
            regions: default_regions(),
            markets: default_markets(),
            daily_request_limit: default_daily_request_limit(),
            poll_interval_seconds: default_poll_interval(),
            opportunity_ttl_seconds: default_opportunity_ttl(),
            http_timeout_ms: default_http_timeout_ms(),
            total_investment: default_total_investment(),
            min_roi: 0.0,
            arb_threshold: default_arb_threshold(),
            stake_decimals: default_stake_decimals(),
            round_stakes: true,
            commission: 0.0,
            book_commissions: Vec::new(),
            over_synonyms: Vec::new(),
            under_synonyms: Vec::new(),
            port: default_port(),
            rust_log: default_log_level(),
            verbose: false,
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Ok(envy::from_env()?)
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if Url::parse(&self.odds_api_url).is_err() {
            return invalid("ODDS_API_URL must be an absolute URL");
        }

        if self.sports.iter().all(|s| s.trim().is_empty()) {
            return invalid("SPORTS must name at least one sport key");
        }

        if !self.total_investment.is_finite() || self.total_investment <= 0.0 {
            return invalid("TOTAL_INVESTMENT must be a positive number");
        }

        if !self.min_roi.is_finite() {
            return invalid("MIN_ROI must be finite");
        }

        if !(self.arb_threshold > 0.0 && self.arb_threshold <= 1.0) {
            return invalid("ARB_THRESHOLD must be in (0, 1]");
        }

        if self.stake_decimals > 8 {
            return invalid("STAKE_DECIMALS must be at most 8");
        }

        if !valid_rate(self.commission) {
            return invalid("COMMISSION must be in [0, 1)");
        }

        if let Some(bad) = self
            .book_commissions
            .iter()
            .find(|entry| parse_book_commission(entry).is_none())
        {
            return Err(ConfigError::Invalid(format!(
                "BOOK_COMMISSIONS entry '{}' must look like book=rate with rate in [0, 1)",
                bad
            )));
        }

        if self.commission > 0.0 && !self.book_commissions.is_empty() {
            return invalid("set either COMMISSION or BOOK_COMMISSIONS, not both");
        }

        if self.poll_interval_seconds == 0 {
            return invalid("POLL_INTERVAL_SECONDS must be at least 1");
        }

        if self.opportunity_ttl_seconds != 0
            && self.opportunity_ttl_seconds < self.poll_interval_seconds
        {
            return invalid("OPPORTUNITY_TTL_SECONDS must be 0 or at least POLL_INTERVAL_SECONDS");
        }

        if tracing_subscriber::EnvFilter::try_new(&self.rust_log).is_err() {
            return invalid("RUST_LOG is not a valid log filter");
        }

        Ok(())
    }

    /// Sport keys with blanks removed.
    pub fn sport_keys(&self) -> Vec<String> {
        self.sports
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Build the engine tuning once.
    pub fn engine_options(&self) -> EngineOptions {
        let rounding = if self.round_stakes {
            RoundingMode::Floor {
                decimals: self.stake_decimals,
            }
        } else {
            RoundingMode::Exact
        };

        let overrides: HashMap<String, f64> = self
            .book_commissions
            .iter()
            .filter_map(|entry| parse_book_commission(entry))
            .collect();

        let commission = if !overrides.is_empty() {
            Commission::PerBook(overrides)
        } else if self.commission > 0.0 {
            Commission::Flat(self.commission)
        } else {
            Commission::None
        };

        EngineOptions {
            arb_threshold: self.arb_threshold,
            rounding,
            commission,
        }
    }

    /// Default synonyms plus configured locale substrings.
    pub fn synonyms(&self) -> OutcomeSynonyms {
        OutcomeSynonyms::default()
            .with_over(&self.over_synonyms)
            .with_under(&self.under_synonyms)
    }

    /// Inputs for a scan using the configured investment and ROI floor.
    pub fn scan_settings(&self) -> ScanSettings {
        ScanSettings {
            total_investment: self.total_investment,
            min_roi: self.min_roi,
            engine: self.engine_options(),
            synonyms: self.synonyms(),
        }
    }

    /// Maximum age of a board entry, `None` when entries never expire.
    pub fn opportunity_ttl(&self) -> Option<Duration> {
        (self.opportunity_ttl_seconds > 0)
            .then(|| Duration::from_secs(self.opportunity_ttl_seconds))
    }

    /// Log directives from `RUST_LOG`, or the verbose set when either
    /// `VERBOSE` or the command line asks for it.
    pub fn log_filter(&self, cli_verbose: bool) -> &str {
        if cli_verbose || self.verbose {
            VERBOSE_LOG_FILTER
        } else {
            &self.rust_log
        }
    }

    /// Check if live polling is possible.
    pub fn has_api_key(&self) -> bool {
        self.odds_api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }
}
