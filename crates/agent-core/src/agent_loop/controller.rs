//! Agent Loop Controller - one observe-think-act step at a time.
//!
//! A step moves through context preparation, the decision call, action
//! execution and post-processing. Whatever happens in those phases, the
//! step is finalized into exactly one history record; the only exception
//! is a pure pause/stop interruption, which leaves no record behind.

use std::sync::Arc;

use action_primitives::{
    ActionExecutor, ActionKind, ActionRegistry, ActionResult, AgentAction, BrowserEnvironment,
    BrowserSnapshot, ExecutionContext, SnapshotOptions,
};
use chrono::{DateTime, Utc};
use steptrail_core_types::{AgentId, TaskId};
use tracing::{debug, info, warn};

use super::config::AgentLoopConfig;
use super::control::{Interrupt, PauseStopController};
use super::decision::{DecisionOracle, RetryFallbackController};
use super::hooks::{NoopHooks, RunHooks, TraceJudge};
use super::multi_act::MultiActRunner;
use super::state::AgentRunState;
use super::types::{AgentOutput, DecisionContext};
use crate::errors::AgentError;
use crate::history::{HistoryStore, StateDigest, StepMetadata, StepRecord};

/// How a call to [`AgentLoopController::step`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// A history record was appended.
    Recorded,
    /// A pause or stop was observed; nothing was recorded.
    Interrupted(Interrupt),
}

/// What a step produced before it was finalized.
#[derive(Debug, Default)]
struct StepScratch {
    snapshot: Option<BrowserSnapshot>,
    output: Option<AgentOutput>,
}

/// Drives a single agent run against one environment.
pub struct AgentLoopController {
    pub(super) id: AgentId,
    pub(super) task_id: TaskId,
    pub(super) task: String,
    pub(super) config: AgentLoopConfig,
    environment: Arc<dyn BrowserEnvironment>,
    registry: ActionRegistry,
    decider: RetryFallbackController,
    pub(super) multi_act: MultiActRunner,
    pub(super) control: PauseStopController,
    pub(super) state: AgentRunState,
    pub(super) history: HistoryStore,
    pub(super) hooks: Arc<dyn RunHooks>,
    pub(super) judge: Option<Arc<dyn TraceJudge>>,
    pub(super) initial_actions: Vec<AgentAction>,
}

impl AgentLoopController {
    pub fn new(
        task: impl Into<String>,
        config: AgentLoopConfig,
        environment: Arc<dyn BrowserEnvironment>,
        executor: Arc<dyn ActionExecutor>,
        oracle: Arc<dyn DecisionOracle>,
    ) -> Self {
        let decider = RetryFallbackController::new(oracle, &config);
        let multi_act = MultiActRunner::new(executor, config.wait_between_actions_duration());
        Self {
            id: AgentId::new(),
            task_id: TaskId::new(),
            task: task.into(),
            config,
            environment,
            registry: ActionRegistry::default(),
            decider,
            multi_act,
            control: PauseStopController::new(),
            state: AgentRunState::default(),
            history: HistoryStore::new(),
            hooks: Arc::new(NoopHooks),
            judge: None,
            initial_actions: Vec::new(),
        }
    }

    pub fn with_fallback_oracle(mut self, fallback: Arc<dyn DecisionOracle>) -> Self {
        self.decider = self.decider.with_fallback(fallback);
        self
    }

    pub fn with_registry(mut self, registry: ActionRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn RunHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_judge(mut self, judge: Arc<dyn TraceJudge>) -> Self {
        self.judge = Some(judge);
        self
    }

    /// Actions executed once before the first decision, recorded as step 0.
    pub fn with_initial_actions(mut self, actions: Vec<AgentAction>) -> Self {
        self.initial_actions = actions;
        self
    }

    pub fn id(&self) -> &AgentId {
        &self.id
    }

    /// Changes whenever a follow-up task replaces the current one.
    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn config(&self) -> &AgentLoopConfig {
        &self.config
    }

    pub fn state(&self) -> &AgentRunState {
        &self.state
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn is_using_fallback(&self) -> bool {
        self.decider.is_using_fallback()
    }

    /// Handle for pausing, resuming or stopping the run from another task.
    pub fn control(&self) -> PauseStopController {
        self.control.clone()
    }

    pub fn pause(&self) {
        self.control.pause();
    }

    pub fn resume(&self) {
        self.control.resume();
    }

    pub fn stop(&self) {
        self.control.stop();
    }

    /// Continue the run with a new task. Initial actions are not repeated.
    pub fn add_new_task(&mut self, task: impl Into<String>) {
        self.task = task.into();
        self.task_id = TaskId::new();
        self.state.follow_up_task = true;
        info!(agent = %self.id, task_id = %self.task_id, "follow-up task added");
    }

    fn forced_completion(&self, step_number: u32) -> bool {
        let last_step = step_number >= self.config.max_steps;
        let out_of_failures = self.state.consecutive_failures >= self.config.max_failures
            && self.config.final_response_after_failure;
        last_step || out_of_failures
    }

    /// Execute one step. Errors are recorded in history, never returned.
    pub async fn step(&mut self) -> StepStatus {
        let step_number = self.state.n_steps + 1;
        let started_at = Utc::now();
        let mut scratch = StepScratch::default();

        let limit = self.config.step_timeout_duration();
        let outcome = match tokio::time::timeout(limit, self.run_phases(step_number, &mut scratch))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(AgentError::StepTimeout {
                step: step_number,
                limit,
            }),
        };

        match outcome {
            Ok(results) => self.post_process(step_number, results),
            Err(AgentError::Interrupted(reason)) => {
                debug!(step = step_number, %reason, "step interrupted, nothing recorded");
                return StepStatus::Interrupted(reason);
            }
            Err(err) => self.handle_step_error(step_number, err),
        }

        self.finalize(step_number, started_at, scratch);
        StepStatus::Recorded
    }

    async fn run_phases(
        &mut self,
        step_number: u32,
        scratch: &mut StepScratch,
    ) -> Result<Vec<ActionResult>, AgentError> {
        self.control.check().map_err(AgentError::Interrupted)?;
        debug!(step = step_number, "preparing context");

        let snapshot = self
            .environment
            .snapshot(SnapshotOptions {
                include_screenshot: self.config.enable_vision,
            })
            .await?;
        scratch.snapshot = Some(snapshot.clone());

        let forced = self.forced_completion(step_number);
        let vocabulary = if forced {
            info!(
                step = step_number,
                failures = self.state.consecutive_failures,
                "forcing completion, only done is offered"
            );
            vec![ActionKind::Done]
        } else {
            self.registry.vocabulary_for(&snapshot)
        };

        let ctx = DecisionContext {
            task: self.task.clone(),
            step_number,
            max_steps: self.config.max_steps,
            snapshot,
            vocabulary,
            forced_completion: forced,
            last_output: self.state.last_output.clone(),
            last_results: self.state.last_results.clone(),
            clarification: None,
        };

        debug!(step = step_number, "awaiting decision");
        let output = self.decider.decide(&ctx).await?;
        scratch.output = Some(output.clone());
        self.state.last_output = Some(output.clone());
        self.control.check().map_err(AgentError::Interrupted)?;

        debug!(step = step_number, actions = output.actions.len(), "executing actions");
        let exec_ctx = ExecutionContext {
            step_number,
            available_file_paths: self.config.available_file_paths.clone(),
        };
        let batch = self
            .multi_act
            .run(&output.actions, &exec_ctx, &self.control)
            .await?;
        if let Some(reason) = batch.interrupted {
            self.state.last_results = batch.results;
            return Err(AgentError::Interrupted(reason));
        }
        if let Err(reason) = self.control.check() {
            self.state.last_results = batch.results;
            return Err(AgentError::Interrupted(reason));
        }
        Ok(batch.results)
    }

    fn post_process(&mut self, step_number: u32, results: Vec<ActionResult>) {
        if let Some(last) = results.last().filter(|r| r.is_done) {
            info!(
                step = step_number,
                success = last.success.unwrap_or(false),
                result = last.extracted_content.as_deref().unwrap_or_default(),
                "task finished"
            );
        }
        self.state.apply_batch(results);
        if self.state.consecutive_failures > 0 {
            warn!(
                step = step_number,
                failures = self.state.consecutive_failures,
                "step action failed"
            );
        }
    }

    fn handle_step_error(&mut self, step_number: u32, err: AgentError) {
        let message = err.format_error();
        self.state.apply_step_error(message.clone());
        warn!(
            step = step_number,
            failures = self.state.consecutive_failures,
            limit = self.config.failure_limit(),
            error = %message,
            "step failed"
        );
    }

    fn finalize(&mut self, step_number: u32, started_at: DateTime<Utc>, scratch: StepScratch) {
        let step_interval_ms = self
            .history
            .last()
            .and_then(|record| record.metadata.as_ref())
            .map(StepMetadata::duration_ms);

        let state = match (&scratch.snapshot, &scratch.output) {
            (Some(snapshot), Some(output)) => StateDigest::capture(snapshot, &output.actions),
            (Some(snapshot), None) => StateDigest::capture(snapshot, &[]),
            (None, _) => StateDigest::default(),
        };

        self.history.push(StepRecord {
            model_output: scratch.output,
            result: self.state.last_results.clone(),
            state,
            metadata: Some(StepMetadata {
                step_number,
                step_start_time: started_at,
                step_end_time: Utc::now(),
                step_interval_ms,
            }),
        });
        self.state.n_steps += 1;
        debug!(step = step_number, records = self.history.len(), "step finalized");
    }
}
