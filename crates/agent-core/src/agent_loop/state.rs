use action_primitives::ActionResult;
use serde::{Deserialize, Serialize};

use super::types::AgentOutput;

/// Mutable per-run bookkeeping, owned by the loop controller.
///
/// Pause and stop flags live on [`super::PauseStopController`] so that
/// other tasks can signal the run without touching this struct.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentRunState {
    /// Decision steps recorded so far (initial actions excluded).
    pub n_steps: u32,
    pub consecutive_failures: u32,
    pub last_output: Option<AgentOutput>,
    pub last_results: Vec<ActionResult>,
    /// Set by a follow-up task so initial actions do not run again.
    pub follow_up_task: bool,
}

impl AgentRunState {
    /// A batch with exactly one errored result counts as a failure; any
    /// other batch resets the counter.
    pub fn apply_batch(&mut self, results: Vec<ActionResult>) {
        if results.len() == 1 && results[0].has_error() {
            self.consecutive_failures += 1;
        } else {
            self.consecutive_failures = 0;
        }
        self.last_results = results;
    }

    pub fn apply_step_error(&mut self, message: String) {
        self.consecutive_failures += 1;
        self.last_results = vec![ActionResult::error(message)];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_single_error_batches_count_as_failures() {
        let mut state = AgentRunState::default();
        state.apply_batch(vec![ActionResult::error("missing element")]);
        assert_eq!(state.consecutive_failures, 1);

        state.apply_batch(vec![
            ActionResult::extracted("ok"),
            ActionResult::error("second failed"),
        ]);
        assert_eq!(state.consecutive_failures, 0);

        state.apply_step_error("timeout".into());
        state.apply_step_error("timeout".into());
        assert_eq!(state.consecutive_failures, 2);
        assert_eq!(state.last_results[0].error.as_deref(), Some("timeout"));
    }
}
