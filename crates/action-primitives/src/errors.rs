//! Error types for action primitives

use thiserror::Error;

/// Errors raised at the executor/environment boundary.
///
/// Expected environment failures are reported inside an `ActionResult`;
/// these variants are reserved for contract violations and for failures
/// of the environment itself (for example, a snapshot that cannot be taken).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ActionError {
    /// The environment could not be reached or returned garbage
    #[error("Environment error: {0}")]
    Environment(String),

    /// The action payload is malformed
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// The action kind is not part of the vocabulary for the current page
    #[error("Action not available: {0}")]
    NotAvailable(String),

    /// The executor produced a result that violates the result contract
    #[error("Invalid action result: {0}")]
    InvalidResult(String),

    /// Operation was cancelled or interrupted
    #[error("Operation interrupted: {0}")]
    Interrupted(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ActionError {
    pub fn environment(message: impl Into<String>) -> Self {
        Self::Environment(message.into())
    }

    pub fn invalid_action(message: impl Into<String>) -> Self {
        Self::InvalidAction(message.into())
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, ActionError::Environment(_) | ActionError::Interrupted(_))
    }

    /// Get error severity level (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            ActionError::Internal(_) | ActionError::InvalidResult(_) => 3,
            ActionError::Environment(_) => 2,
            ActionError::InvalidAction(_) | ActionError::NotAvailable(_) => 1,
            ActionError::Interrupted(_) => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_errors_are_retryable() {
        assert!(ActionError::environment("socket closed").is_retryable());
        assert!(!ActionError::invalid_action("no index").is_retryable());
        assert_eq!(ActionError::InvalidResult("x".into()).severity(), 3);
    }
}
