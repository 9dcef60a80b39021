//! Error types for element matching

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LocatorError {
    /// No level of the cascade found the recorded element.
    #[error(
        "Could not find matching element for action {action_index} in current page.\n  \
         Looking for: {looking_for}\n  \
         Page has {element_count} interactive elements.{nearby}\n  \
         Tried: EXACT hash → STABLE hash → XPATH → ATTRIBUTE matching"
    )]
    NoMatch {
        action_index: usize,
        looking_for: String,
        element_count: usize,
        /// Pre-formatted hint about same-kind candidates, possibly empty.
        nearby: String,
    },

    /// A recorded identity belongs to an action that takes no element.
    #[error("Action {action_index} ({action}) has a recorded element but no element target")]
    NotRemappable {
        action_index: usize,
        action: &'static str,
    },
}

impl LocatorError {
    /// Page content may still be rendering, so a later snapshot can match.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LocatorError::NoMatch { .. })
    }

    pub fn action_index(&self) -> usize {
        match self {
            LocatorError::NoMatch { action_index, .. }
            | LocatorError::NotRemappable { action_index, .. } => *action_index,
        }
    }
}
