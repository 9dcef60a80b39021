use action_primitives::JudgementResult;
use async_trait::async_trait;

use super::state::AgentRunState;
use crate::errors::AgentError;
use crate::history::HistoryStore;

/// Callbacks awaited around every step of a run.
#[async_trait]
pub trait RunHooks: Send + Sync {
    async fn on_step_start(&self, _state: &AgentRunState, _history: &HistoryStore) {}

    async fn on_step_end(&self, _state: &AgentRunState, _history: &HistoryStore) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl RunHooks for NoopHooks {}

/// Evaluates a finished trace against its task.
#[async_trait]
pub trait TraceJudge: Send + Sync {
    async fn judge(&self, task: &str, history: &HistoryStore)
        -> Result<JudgementResult, AgentError>;
}
