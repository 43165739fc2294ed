//! Odds provider module.
//!
//! This module handles:
//! - The provider payload model
//! - Per-day request budgeting
//! - HTTP fetching and an in-memory source for tests

pub mod budget;
pub mod client;
pub mod mock;
pub mod types;

pub use budget::DailyBudget;
pub use client::{OddsApiClient, OddsSource};
pub use mock::FixtureSource;
pub use types::{Bookmaker, OddsEvent, ProviderMarket};
