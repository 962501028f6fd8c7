// src/lib.rs
// Public library surface for the service binary, the probe binary and integration tests.

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod matching;
pub mod metrics;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::matching::{MatchEngine, MatchRequest, MatchResult, Strategy};
