use action_primitives::{ActionResult, AgentAction, BrowserSnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use steptrail_core_types::{ElementIdentity, TabInfo};

use crate::agent_loop::AgentOutput;

/// What the browser looked like when a step was decided.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDigest {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tabs: Vec<TabInfo>,
    /// One slot per decided action: the element it targeted, if any.
    #[serde(default)]
    pub interacted_elements: Vec<Option<ElementIdentity>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
}

impl StateDigest {
    pub fn capture(snapshot: &BrowserSnapshot, actions: &[AgentAction]) -> Self {
        Self {
            url: snapshot.url.clone(),
            title: snapshot.title.clone(),
            tabs: snapshot.tabs.clone(),
            interacted_elements: snapshot.interacted_elements(actions),
            screenshot: snapshot.screenshot.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepMetadata {
    pub step_number: u32,
    pub step_start_time: DateTime<Utc>,
    pub step_end_time: DateTime<Utc>,
    /// Duration of the previous step, used to pace replays.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_interval_ms: Option<u64>,
}

impl StepMetadata {
    pub fn duration_ms(&self) -> u64 {
        (self.step_end_time - self.step_start_time)
            .num_milliseconds()
            .max(0) as u64
    }
}

/// One entry of the run history. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// `None` for synthetic records.
    #[serde(default)]
    pub model_output: Option<AgentOutput>,
    #[serde(default)]
    pub result: Vec<ActionResult>,
    #[serde(default)]
    pub state: StateDigest,
    #[serde(default)]
    pub metadata: Option<StepMetadata>,
}

impl StepRecord {
    pub fn actions(&self) -> &[AgentAction] {
        self.model_output
            .as_ref()
            .map(|output| output.actions.as_slice())
            .unwrap_or_default()
    }

    pub fn first_error(&self) -> Option<&str> {
        self.result.iter().find_map(|r| r.error.as_deref())
    }

    pub fn has_error(&self) -> bool {
        self.first_error().is_some()
    }

    pub fn is_done(&self) -> bool {
        self.result.last().is_some_and(|r| r.is_done)
    }

    pub fn step_number(&self) -> Option<u32> {
        self.metadata.as_ref().map(|m| m.step_number)
    }

    pub fn next_goal(&self) -> Option<&str> {
        self.model_output.as_ref().and_then(|o| o.next_goal.as_deref())
    }
}
