//! Replay layer
//!
//! Re-executes a recorded [`HistoryStore`](agent_core::HistoryStore) against a
//! live environment. Recorded element targets are re-identified in each new
//! snapshot, failing steps are retried with exponential backoff, and a final
//! summary result reports how many steps succeeded.

pub mod config;
pub mod engine;
pub mod errors;
pub mod redundant;
pub mod strategies;
pub mod summary;

pub use config::ReplayConfig;
pub use engine::{ReplayEngine, ReplayReport};
pub use errors::ReplayError;
pub use redundant::is_redundant_retry;
pub use strategies::{DefaultFailureHandler, FailureHandler, FailureHandlerResult};
pub use summary::{fallback_summary, RerunSummarizer};
