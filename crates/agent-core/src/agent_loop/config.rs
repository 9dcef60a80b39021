//! Configuration for agent loop execution.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the agent loop (observe-think-act) execution mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentLoopConfig {
    /// Maximum decision steps before the run is classified as out of steps.
    /// Default: 100
    pub max_steps: u32,

    /// Maximum actions executed from one decision; extra actions are dropped.
    /// Default: 3
    pub max_actions_per_step: u32,

    /// Consecutive failures before the loop gives up.
    /// Default: 3
    pub max_failures: u32,

    /// Grant one extra, completion-only step once `max_failures` is reached.
    /// Default: true
    pub final_response_after_failure: bool,

    /// Whether snapshots include a screenshot (vision mode).
    /// Default: true
    pub enable_vision: bool,

    /// Deadline for one decision call, including the empty-output retry.
    /// Default: 60000 (60 seconds)
    pub llm_timeout_ms: u64,

    /// Step-level timeout in milliseconds (entire observe-think-act cycle).
    /// Default: 180000 (3 minutes)
    pub step_timeout_ms: u64,

    /// Minimum wait between actions of one batch in milliseconds.
    /// Default: 100
    pub wait_between_actions_ms: u64,

    /// Re-ask the oracle once when it returns no actions.
    /// Default: true
    pub retry_on_empty_decision: bool,

    /// Judge the trace once the run completes.
    /// Default: false
    pub use_judge: bool,

    /// Files the executor may upload.
    pub available_file_paths: Vec<String>,
}

impl Default for AgentLoopConfig {
    fn default() -> Self {
        Self {
            max_steps: 100,
            max_actions_per_step: 3,
            max_failures: 3,
            final_response_after_failure: true,
            enable_vision: true,
            llm_timeout_ms: 60_000,
            step_timeout_ms: 180_000,
            wait_between_actions_ms: 100,
            retry_on_empty_decision: true,
            use_judge: false,
            available_file_paths: Vec::new(),
        }
    }
}

impl AgentLoopConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a minimal config for testing.
    pub fn minimal() -> Self {
        Self {
            max_steps: 10,
            max_actions_per_step: 1,
            max_failures: 2,
            final_response_after_failure: false,
            enable_vision: false,
            llm_timeout_ms: 10_000,
            step_timeout_ms: 30_000,
            wait_between_actions_ms: 0,
            retry_on_empty_decision: false,
            use_judge: false,
            available_file_paths: Vec::new(),
        }
    }

    /// Create a config optimized for fast execution.
    pub fn fast() -> Self {
        Self {
            max_steps: 50,
            max_failures: 2,
            enable_vision: false,
            llm_timeout_ms: 30_000,
            step_timeout_ms: 60_000,
            wait_between_actions_ms: 50,
            ..Self::default()
        }
    }

    /// Builder: set max steps.
    pub fn max_steps(mut self, steps: u32) -> Self {
        self.max_steps = steps;
        self
    }

    /// Builder: set vision mode.
    pub fn vision(mut self, enabled: bool) -> Self {
        self.enable_vision = enabled;
        self
    }

    /// Builder: set max actions per step.
    pub fn actions_per_step(mut self, count: u32) -> Self {
        self.max_actions_per_step = count;
        self
    }

    /// Builder: set the consecutive failure budget.
    pub fn max_failures(mut self, failures: u32, final_response: bool) -> Self {
        self.max_failures = failures;
        self.final_response_after_failure = final_response;
        self
    }

    /// Builder: set LLM timeout.
    pub fn llm_timeout(mut self, ms: u64) -> Self {
        self.llm_timeout_ms = ms;
        self
    }

    /// Builder: set step timeout.
    pub fn step_timeout(mut self, ms: u64) -> Self {
        self.step_timeout_ms = ms;
        self
    }

    /// Builder: set the pause between batched actions.
    pub fn wait_between_actions(mut self, ms: u64) -> Self {
        self.wait_between_actions_ms = ms;
        self
    }

    /// Builder: enable trace judging.
    pub fn judge(mut self, enabled: bool) -> Self {
        self.use_judge = enabled;
        self
    }

    /// Consecutive failures at which the run terminates.
    pub fn failure_limit(&self) -> u32 {
        self.max_failures + u32::from(self.final_response_after_failure)
    }

    pub fn llm_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.llm_timeout_ms)
    }

    pub fn step_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.step_timeout_ms)
    }

    pub fn wait_between_actions_duration(&self) -> Duration {
        Duration::from_millis(self.wait_between_actions_ms)
    }
}
