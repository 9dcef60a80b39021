//! Core data types for the agent loop execution mode.

use action_primitives::{ActionKind, ActionResult, AgentAction, BrowserSnapshot};
use serde::{Deserialize, Serialize};

/// Oracle output for a single agent loop iteration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentOutput {
    /// Chain-of-thought reasoning about current state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,

    /// Evaluation of whether the previous action achieved its goal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation_previous_goal: Option<String>,

    /// Important facts to remember for future steps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,

    /// Immediate next objective.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_goal: Option<String>,

    /// Actions to execute (typically 1-3).
    #[serde(default)]
    pub actions: Vec<AgentAction>,
}

impl AgentOutput {
    pub fn with_actions(actions: Vec<AgentAction>) -> Self {
        Self {
            actions,
            ..Self::default()
        }
    }

    pub fn next_goal(mut self, goal: impl Into<String>) -> Self {
        self.next_goal = Some(goal.into());
        self
    }

    /// True when there is nothing executable: no actions, or placeholders only.
    pub fn has_no_actions(&self) -> bool {
        self.actions.iter().all(AgentAction::is_placeholder)
    }

    /// Check if output contains a done action.
    pub fn is_done(&self) -> bool {
        self.actions.iter().any(AgentAction::is_done)
    }
}

/// Everything an oracle sees when asked for the next decision.
#[derive(Debug, Clone)]
pub struct DecisionContext {
    pub task: String,
    pub step_number: u32,
    pub max_steps: u32,
    pub snapshot: BrowserSnapshot,
    /// Kinds the oracle may choose from on this step.
    pub vocabulary: Vec<ActionKind>,
    /// Set on the last allowed step or once the failure budget is spent.
    pub forced_completion: bool,
    pub last_output: Option<AgentOutput>,
    pub last_results: Vec<ActionResult>,
    /// Extra instruction added when the previous response carried no actions.
    pub clarification: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_only_output_counts_as_empty() {
        assert!(AgentOutput::default().has_no_actions());
        assert!(AgentOutput::with_actions(vec![AgentAction::Noop {}]).has_no_actions());
        assert!(!AgentOutput::with_actions(vec![AgentAction::Noop {}, AgentAction::click(1)])
            .has_no_actions());
    }
}
