//! Boundary to the external browser.
//!
//! The agent loop and the replay engine only see the browser through
//! [`BrowserEnvironment`] (state snapshots) and [`ActionExecutor`]
//! (running one action). Neither trait knows about retries or the oracle.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use steptrail_core_types::{ElementIdentity, TabInfo};

use crate::{errors::ActionError, result::ActionResult, types::AgentAction};

/// Browser state as consumed by the loop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrowserSnapshot {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub tabs: Vec<TabInfo>,
    /// Interactive elements keyed by the index the oracle refers to.
    #[serde(default)]
    pub elements: BTreeMap<u32, ElementIdentity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
}

impl BrowserSnapshot {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_element(mut self, index: u32, element: ElementIdentity) -> Self {
        self.elements.insert(index, element);
        self
    }

    pub fn element(&self, index: u32) -> Option<&ElementIdentity> {
        self.elements.get(&index)
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Identities of the elements the given actions address, one slot per action.
    pub fn interacted_elements(&self, actions: &[AgentAction]) -> Vec<Option<ElementIdentity>> {
        actions
            .iter()
            .map(|action| {
                action
                    .element_index()
                    .and_then(|index| self.element(index).cloned())
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotOptions {
    pub include_screenshot: bool,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            include_screenshot: true,
        }
    }
}

/// Auxiliary data handed to the executor with every action.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    pub step_number: u32,
    pub available_file_paths: Vec<String>,
}

/// Source of browser state snapshots.
#[async_trait]
pub trait BrowserEnvironment: Send + Sync {
    async fn snapshot(&self, options: SnapshotOptions) -> Result<BrowserSnapshot, ActionError>;
}

/// Runs one action against the browser.
///
/// Expected failures (element missing, navigation error) come back as an
/// `ActionResult` with `error` set. `Err` is reserved for contract
/// violations and aborts the current step.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn execute(
        &self,
        action: &AgentAction,
        ctx: &ExecutionContext,
    ) -> Result<ActionResult, ActionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interacted_elements_align_with_actions() {
        let button = ElementIdentity::new("button", "/html/body/button", [("id", "go")]);
        let snapshot = BrowserSnapshot::new("https://example.com", "Example")
            .with_element(3, button.clone());

        let slots = snapshot.interacted_elements(&[
            AgentAction::navigate("https://example.com/next"),
            AgentAction::click(3),
            AgentAction::click(7),
        ]);

        assert_eq!(slots, vec![None, Some(button), None]);
    }
}
