//! Replay configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Replay pacing, retry and tolerance settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Attempts per step before it counts as failed.
    pub max_retries: u32,
    /// Record failures and keep going instead of aborting. Also skips steps
    /// that already failed in the recorded run.
    pub skip_failures: bool,
    /// Pause before a step whose record carries no interval.
    pub delay_between_actions_ms: u64,
    /// Ceiling on the recorded interval replayed before each step.
    pub max_step_interval_ms: u64,
    pub base_retry_delay_ms: u64,
    pub max_retry_delay_ms: u64,
    /// Poll for late-rendering elements before matching.
    pub wait_for_elements: bool,
    pub element_wait_timeout_ms: u64,
    pub element_poll_interval_ms: u64,
    /// Pause between actions of one replayed step.
    pub wait_between_actions_ms: u64,
    pub available_file_paths: Vec<String>,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            skip_failures: false,
            delay_between_actions_ms: 2_000,
            max_step_interval_ms: 45_000,
            base_retry_delay_ms: 5_000,
            max_retry_delay_ms: 30_000,
            wait_for_elements: false,
            element_wait_timeout_ms: 15_000,
            element_poll_interval_ms: 1_000,
            wait_between_actions_ms: 100,
            available_file_paths: Vec::new(),
        }
    }
}

impl ReplayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries.max(1);
        self
    }

    pub fn skip_failures(mut self, skip: bool) -> Self {
        self.skip_failures = skip;
        self
    }

    pub fn pacing(mut self, delay_between_actions_ms: u64, max_step_interval_ms: u64) -> Self {
        self.delay_between_actions_ms = delay_between_actions_ms;
        self.max_step_interval_ms = max_step_interval_ms;
        self
    }

    pub fn retry_backoff(mut self, base_ms: u64, max_ms: u64) -> Self {
        self.base_retry_delay_ms = base_ms;
        self.max_retry_delay_ms = max_ms;
        self
    }

    pub fn wait_for_elements(mut self, timeout_ms: u64, poll_interval_ms: u64) -> Self {
        self.wait_for_elements = true;
        self.element_wait_timeout_ms = timeout_ms;
        self.element_poll_interval_ms = poll_interval_ms;
        self
    }

    /// Delay before replaying a step recorded `interval_ms` after its predecessor.
    pub fn step_delay(&self, interval_ms: Option<u64>) -> Duration {
        let ms = match interval_ms {
            Some(interval) if interval > 0 => interval.min(self.max_step_interval_ms),
            _ => self.delay_between_actions_ms,
        };
        Duration::from_millis(ms)
    }

    pub fn element_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.element_wait_timeout_ms)
    }

    pub fn element_poll_interval(&self) -> Duration {
        Duration::from_millis(self.element_poll_interval_ms.max(1))
    }

    pub fn wait_between_actions(&self) -> Duration {
        Duration::from_millis(self.wait_between_actions_ms)
    }
}
