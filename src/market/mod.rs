//! Market module for provider market classification.
//!
//! This module handles:
//! - Canonical outcome and market family types
//! - Market/outcome normalization and coverage checks

pub mod normalizer;
pub mod types;

pub use normalizer::{
    normalize, normalize_outcome_key, normalize_outcome_key_with, validate_coverage,
    OutcomeSynonyms, MARKET_H2H, MARKET_TOTALS,
};
pub use types::{FamilyKind, MarketFamily, NormalizedMarket, OutcomeKey, Period, RawOutcome};
