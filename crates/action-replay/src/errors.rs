//! Replay error types

use action_locator::LocatorError;
use action_primitives::ActionError;
use agent_core::{HistoryError, Interrupt};
use thiserror::Error;

/// Replay errors
#[derive(Debug, Error)]
pub enum ReplayError {
    /// A recorded element could not be found in the current page.
    #[error(transparent)]
    MatchFailure(#[from] LocatorError),

    /// Step still failing once its retries were spent.
    #[error("{step_name} failed after {attempts} attempts: {reason}")]
    StepFailed {
        step_name: String,
        attempts: u32,
        reason: String,
    },

    /// An executed action reported an error result.
    #[error("Action failed: {0}")]
    ActionFailed(String),

    #[error(transparent)]
    Environment(#[from] ActionError),

    #[error("replay {0}")]
    Interrupted(Interrupt),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error("summary failed: {0}")]
    Summary(String),
}

impl ReplayError {
    /// Whether another attempt at the same step could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ReplayError::MatchFailure(err) => err.is_retryable(),
            ReplayError::ActionFailed(_) => true,
            ReplayError::Environment(err) => err.is_retryable(),
            ReplayError::StepFailed { .. }
            | ReplayError::Interrupted(_)
            | ReplayError::History(_)
            | ReplayError::Summary(_) => false,
        }
    }
}
