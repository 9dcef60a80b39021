//! Shared primitives for the steptrail crates: run identifiers, durable
//! element identities and tab descriptors.

use std::fmt;

use uuid::Uuid;

mod element;

pub use element::{ElementIdentity, IDENTIFYING_ATTRIBUTES};

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A browser tab as seen in a snapshot.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TabInfo {
    pub tab_id: String,
    pub url: String,
    pub title: String,
}

impl TabInfo {
    pub fn new(tab_id: impl Into<String>, url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            tab_id: tab_id.into(),
            url: url.into(),
            title: title.into(),
        }
    }
}
