//! Sports-betting surebet scanner.
//!
//! Normalizes bookmaker markets into canonical outcomes, picks the best price
//! per outcome across bookmakers, and detects sets whose implied
//! probabilities sum below one. Stakes are split so every outcome pays the
//! same amount.
//!
//! # Strategy
//!
//! If the inverses of the best odds sum to less than 1, backing every outcome
//! in proportion to its inverse guarantees a return:
//!
//! ```text
//! HOME  2.10  -> 1/2.10 = 0.4762
//! DRAW  3.40  -> 1/3.40 = 0.2941
//! AWAY  4.50  -> 1/4.50 = 0.2222
//! ───────────────────────────────
//! Sum:           0.9925 < 1.00
//! ROI:           1/0.9925 - 1 = 0.75%
//! ```
//!
//! # Modules
//!
//! - [`market`]: Canonical outcomes and market normalization
//! - [`arbitrage`]: Engine, best-price selection and event scanning
//! - [`provider`]: Odds provider payloads, request budget and client
//! - [`store`]: Latest-opportunities board
//! - [`poller`]: Periodic fetch-and-scan loop
//! - [`api`]: HTTP API
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Error types
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod arbitrage;
pub mod config;
pub mod error;
pub mod market;
pub mod metrics;
pub mod poller;
pub mod provider;
pub mod store;
pub mod utils;

pub use config::Config;
pub use error::{AppError, Result};
