//! Failure handling for replayed steps

use async_trait::async_trait;
use tokio::time::{sleep, Duration};
use tracing::{info, warn};

use crate::config::ReplayConfig;
use crate::errors::ReplayError;

/// Decides what happens after a replayed step fails.
#[async_trait]
pub trait FailureHandler: Send + Sync {
    /// Handle the `attempt`-th failure (1-based) of a step.
    async fn handle_failure(
        &self,
        step_name: &str,
        error: &ReplayError,
        attempt: u32,
    ) -> FailureHandlerResult;

    /// Check if retry should be attempted
    fn should_retry(&self, error: &ReplayError, attempt: u32) -> bool;

    /// Calculate backoff duration for retry
    fn calculate_backoff(&self, attempt: u32) -> Duration;
}

/// Result of failure handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureHandlerResult {
    /// Abort the entire replay
    Abort(String),

    /// Record the failure and move on to the next step
    Continue(String),

    /// Retry the current step
    Retry { attempt: u32, backoff_ms: u64 },
}

/// Exponential backoff with a ceiling, then abort or skip per configuration.
#[derive(Debug, Clone)]
pub struct DefaultFailureHandler {
    max_retries: u32,
    skip_failures: bool,
    base_delay_ms: u64,
    max_delay_ms: u64,
}

impl DefaultFailureHandler {
    pub fn new(config: &ReplayConfig) -> Self {
        Self {
            max_retries: config.max_retries.max(1),
            skip_failures: config.skip_failures,
            base_delay_ms: config.base_retry_delay_ms,
            max_delay_ms: config.max_retry_delay_ms,
        }
    }
}

impl Default for DefaultFailureHandler {
    fn default() -> Self {
        Self::new(&ReplayConfig::default())
    }
}

#[async_trait]
impl FailureHandler for DefaultFailureHandler {
    async fn handle_failure(
        &self,
        step_name: &str,
        error: &ReplayError,
        attempt: u32,
    ) -> FailureHandlerResult {
        if self.should_retry(error, attempt) {
            let backoff = self.calculate_backoff(attempt);
            warn!(
                step = step_name,
                attempt,
                max = self.max_retries,
                backoff_ms = backoff.as_millis() as u64,
                error = %error,
                "replayed step failed, retrying"
            );
            sleep(backoff).await;
            return FailureHandlerResult::Retry {
                attempt: attempt + 1,
                backoff_ms: backoff.as_millis() as u64,
            };
        }

        let message = format!("{step_name} failed after {attempt} attempts: {error}");
        if self.skip_failures {
            info!(step = step_name, "skipping failed step");
            FailureHandlerResult::Continue(message)
        } else {
            warn!(step = step_name, "aborting replay");
            FailureHandlerResult::Abort(message)
        }
    }

    fn should_retry(&self, error: &ReplayError, attempt: u32) -> bool {
        error.is_retryable() && attempt < self.max_retries
    }

    fn calculate_backoff(&self, attempt: u32) -> Duration {
        // base * 2^(attempt-1)
        let multiplier = 2u64.saturating_pow(attempt.saturating_sub(1));
        let total_ms = self.base_delay_ms.saturating_mul(multiplier);
        Duration::from_millis(total_ms.min(self.max_delay_ms))
    }
}
