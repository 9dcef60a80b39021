use std::time::Duration;

use action_primitives::ActionError;
use thiserror::Error;

use crate::agent_loop::control::Interrupt;

/// Provider status codes that justify switching to the fallback oracle.
pub const FALLBACK_STATUS_CODES: [u16; 7] = [401, 402, 429, 500, 502, 503, 504];

const INVALID_OUTPUT_PREFIX: &str = "Invalid model output format. Please follow the correct schema.";
const RATE_LIMIT_MESSAGE: &str = "Rate limit reached. Waiting before retry.";

/// Errors produced while obtaining a decision from an oracle.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecisionError {
    #[error("decision timed out after {0:?}")]
    Timeout(Duration),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("provider error (status {status_code}): {message}")]
    Provider { status_code: u16, message: String },

    /// The oracle output did not match the expected shape or vocabulary.
    #[error("invalid decision output: {0}")]
    Validation(String),
}

impl DecisionError {
    pub fn provider(status_code: u16, message: impl Into<String>) -> Self {
        Self::Provider {
            status_code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether a fallback oracle should be tried for this failure.
    pub fn is_retryable(&self) -> bool {
        match self {
            DecisionError::RateLimited(_) => true,
            DecisionError::Provider { status_code, .. } => {
                FALLBACK_STATUS_CODES.contains(status_code)
            }
            DecisionError::Timeout(_) | DecisionError::Validation(_) => false,
        }
    }
}

/// Failures reading or writing persisted history.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("history document is malformed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("secret literals could not be compiled: {0}")]
    Redaction(#[from] regex::Error),
}

/// Errors emitted by the agent-core crate.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Decision(#[from] DecisionError),

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error("Step {step} timed out after {limit:?}")]
    StepTimeout { step: u32, limit: Duration },

    /// Cooperative pause/stop signal. Control flow, not a failure.
    #[error("agent {0}")]
    Interrupted(Interrupt),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error("judge failed: {0}")]
    Judge(String),
}

impl AgentError {
    pub fn judge(message: impl Into<String>) -> Self {
        Self::Judge(message.into())
    }

    pub fn is_interruption(&self) -> bool {
        matches!(self, AgentError::Interrupted(_))
    }

    /// Text recorded in history for a failed step.
    pub fn format_error(&self) -> String {
        match self {
            AgentError::Decision(DecisionError::Validation(details)) => {
                format!("{INVALID_OUTPUT_PREFIX}\n\nDetails: {details}")
            }
            AgentError::Decision(DecisionError::RateLimited(_)) => RATE_LIMIT_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_status_codes_are_closed_set() {
        assert!(DecisionError::provider(503, "unavailable").is_retryable());
        assert!(DecisionError::provider(401, "bad key").is_retryable());
        assert!(!DecisionError::provider(400, "bad request").is_retryable());
        assert!(DecisionError::RateLimited("slow down".into()).is_retryable());
        assert!(!DecisionError::validation("missing field").is_retryable());
    }

    #[test]
    fn format_error_per_kind() {
        let validation = AgentError::from(DecisionError::validation("actions: expected list"));
        assert!(validation
            .format_error()
            .starts_with("Invalid model output format."));
        assert!(validation.format_error().ends_with("actions: expected list"));

        let limited = AgentError::from(DecisionError::RateLimited("429".into()));
        assert_eq!(limited.format_error(), RATE_LIMIT_MESSAGE);

        let timeout = AgentError::StepTimeout {
            step: 4,
            limit: Duration::from_secs(180),
        };
        assert_eq!(timeout.format_error(), "Step 4 timed out after 180s");
    }
}
