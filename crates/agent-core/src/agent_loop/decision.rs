//! Decision acquisition: deadline, empty-output retry and provider fallback.

use std::sync::Arc;
use std::time::Duration;

use action_primitives::{ActionRegistry, AgentAction};
use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::config::AgentLoopConfig;
use super::types::{AgentOutput, DecisionContext};
use crate::errors::DecisionError;

/// Instruction appended to the context when the oracle returned no actions.
pub const EMPTY_DECISION_CLARIFICATION: &str = "You forgot to return an action. Please respond with a valid JSON action according to the expected schema with your assessment and next actions.";

/// Text of the unsuccessful `done` substituted for a persistently empty decision.
pub const NO_ACTION_RETURNED: &str = "No next action returned by LLM!";

/// Abstraction over decision-making backends (LLM providers).
#[async_trait]
pub trait DecisionOracle: Send + Sync {
    fn model_name(&self) -> &str;

    /// Decide next action(s) for the given context.
    async fn invoke(&self, ctx: &DecisionContext) -> Result<AgentOutput, DecisionError>;
}

/// Wraps the oracle call with the decision deadline, a single clarification
/// retry for empty outputs, and a one-way switch to a fallback oracle on
/// retryable provider errors.
pub struct RetryFallbackController {
    primary: Arc<dyn DecisionOracle>,
    fallback: Option<Arc<dyn DecisionOracle>>,
    using_fallback: bool,
    timeout: Duration,
    retry_on_empty: bool,
    max_actions: usize,
}

impl RetryFallbackController {
    pub fn new(primary: Arc<dyn DecisionOracle>, config: &AgentLoopConfig) -> Self {
        Self {
            primary,
            fallback: None,
            using_fallback: false,
            timeout: config.llm_timeout_duration(),
            retry_on_empty: config.retry_on_empty_decision,
            max_actions: config.max_actions_per_step.max(1) as usize,
        }
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn DecisionOracle>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn is_using_fallback(&self) -> bool {
        self.using_fallback
    }

    pub fn active_model(&self) -> String {
        self.active().model_name().to_string()
    }

    fn active(&self) -> Arc<dyn DecisionOracle> {
        match (&self.fallback, self.using_fallback) {
            (Some(fallback), true) => fallback.clone(),
            _ => self.primary.clone(),
        }
    }

    /// Obtain a validated decision, trimmed to the per-step action cap.
    pub async fn decide(&mut self, ctx: &DecisionContext) -> Result<AgentOutput, DecisionError> {
        let limit = self.timeout;
        match tokio::time::timeout(limit, self.decide_within_deadline(ctx)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(step = ctx.step_number, ?limit, "decision timed out");
                Err(DecisionError::Timeout(limit))
            }
        }
    }

    async fn decide_within_deadline(
        &mut self,
        ctx: &DecisionContext,
    ) -> Result<AgentOutput, DecisionError> {
        let mut output = self.invoke_with_fallback(ctx).await?;
        let mut synthesized = false;

        if output.has_no_actions() {
            if self.retry_on_empty {
                warn!(
                    step = ctx.step_number,
                    model = %self.active_model(),
                    "decision carried no actions, retrying with clarification"
                );
                let mut retry_ctx = ctx.clone();
                retry_ctx.clarification = Some(EMPTY_DECISION_CLARIFICATION.to_string());
                output = self.invoke_with_fallback(&retry_ctx).await?;
            }
            if output.has_no_actions() {
                warn!(step = ctx.step_number, "decision still empty, substituting done");
                output.actions = vec![AgentAction::done(false, NO_ACTION_RETURNED)];
                synthesized = true;
            }
        }

        output.actions.retain(|action| !action.is_placeholder());
        if output.actions.len() > self.max_actions {
            info!(
                step = ctx.step_number,
                returned = output.actions.len(),
                kept = self.max_actions,
                "trimming actions to the per-step limit"
            );
            output.actions.truncate(self.max_actions);
        }

        if !synthesized {
            for action in &output.actions {
                ActionRegistry::check(action, &ctx.vocabulary)
                    .map_err(|err| DecisionError::validation(err.to_string()))?;
            }
        }

        debug!(
            step = ctx.step_number,
            actions = output.actions.len(),
            "decision accepted"
        );
        Ok(output)
    }

    async fn invoke_with_fallback(
        &mut self,
        ctx: &DecisionContext,
    ) -> Result<AgentOutput, DecisionError> {
        match self.active().invoke(ctx).await {
            Ok(output) => Ok(output),
            Err(err) if err.is_retryable() && !self.using_fallback && self.fallback.is_some() => {
                self.using_fallback = true;
                warn!(
                    error = %err,
                    primary = self.primary.model_name(),
                    fallback = %self.active_model(),
                    "primary oracle failed, switching to fallback for the rest of the run"
                );
                self.active().invoke(ctx).await
            }
            Err(err) => Err(err),
        }
    }
}
