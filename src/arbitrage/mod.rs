//! Arbitrage module for detecting surebets and sizing stakes.
//!
//! This module handles:
//! - Sum-of-inverses evaluation and equal-payout stake allocation
//! - Best-price selection across bookmakers
//! - Event scanning and opportunity records

pub mod calculator;
pub mod detector;
pub mod record;
pub mod selection;

pub use calculator::{
    calculate_surebet, evaluate, ArbResult, Commission, ComputedLeg, EngineOptions, Leg,
    Rejection, RoundingMode, DEFAULT_ARB_THRESHOLD, DEFAULT_STAKE_DECIMALS,
};
pub use detector::{scan_event, scan_events, Opportunity, ScanReport, ScanSettings};
pub use record::{OpportunityRecord, RecordLeg};
pub use selection::{select_best_prices, select_best_prices_by};
