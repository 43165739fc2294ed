//! Unified error types for the surebet scanner.
//!
//! The normalizer and the engine are total and have no error type; only the
//! outer layers (configuration, provider access, request budget) can fail.

use thiserror::Error;

/// Unified error type for the scanner.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Odds provider error.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration loading and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Environment could not be deserialized.
    #[error("failed to load configuration: {0}")]
    Load(#[from] envy::Error),

    /// A value is out of range or malformed.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Odds provider errors.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Request budget for the sport is spent.
    #[error(transparent)]
    Budget(#[from] BudgetError),

    /// No API key configured.
    #[error("ODDS_API_KEY is not set")]
    MissingApiKey,

    /// Provider answered with a non-success status.
    #[error("provider returned {status} for {sport}: {body}")]
    Status {
        /// Sport key requested.
        sport: String,
        /// HTTP status code.
        status: u16,
        /// Response body (truncated).
        body: String,
    },

    /// Response body could not be decoded.
    #[error("failed to parse provider response: {0}")]
    Parse(String),

    /// HTTP request failed.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Request budget errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BudgetError {
    /// Daily ceiling reached for the sport.
    #[error("daily request budget exhausted for {sport} on {day} (limit {limit})")]
    Exhausted {
        /// Sport key.
        sport: String,
        /// UTC day the budget applies to.
        day: time::Date,
        /// Configured ceiling.
        limit: u32,
    },
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, AppError>;
