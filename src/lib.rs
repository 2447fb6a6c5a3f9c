//! LifeDrops - donor eligibility and proximity matching
//!
//! This library provides the matching core used by the LifeDrops blood
//! donation platform: haversine distance, the 90-day donation interval rule,
//! and a two-stage pipeline that narrows a store query result to eligible
//! donors sorted nearest-first. The `services` and `routes` modules wire that
//! core to a hosted document store and an HTTP API.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{distance_km, is_eligible, days_remaining, DonorMatcher, MatchError, MatchOutcome};
pub use crate::models::{BloodGroup, Coordinate, DonorRecord, MatchResult};
