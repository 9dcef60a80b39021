//! Replay engine implementation

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use action_locator::ElementMatcher;
use action_primitives::{
    ActionExecutor, ActionKind, ActionResult, AgentAction, BrowserEnvironment, BrowserSnapshot,
    ExecutionContext, SnapshotOptions,
};
use agent_core::{
    substitute_variables, HistoryStore, Interrupt, MultiActRunner, PauseStopController,
    StepRecord,
};
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use crate::config::ReplayConfig;
use crate::errors::ReplayError;
use crate::redundant::is_redundant_retry;
use crate::strategies::{DefaultFailureHandler, FailureHandler, FailureHandlerResult};
use crate::summary::{fallback_summary, RerunSummarizer};

pub const NO_ACTION_TO_REPLAY: &str = "No action to replay";
pub const REDUNDANT_STEP_SKIPPED: &str = "Skipped - redundant retry of previous step";

/// Upper bound on the element count waited for before matching.
const MAX_EXPECTED_ELEMENTS: usize = 50;
const MAX_ORIGINAL_ERROR_CHARS: usize = 100;

/// Everything a replay produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayReport {
    /// Per-action results and per-step skip/failure markers, in order.
    pub results: Vec<ActionResult>,
    /// The synthesized closing result.
    pub summary: ActionResult,
}

impl ReplayReport {
    pub fn is_success(&self) -> bool {
        self.summary.success == Some(true)
    }

    pub fn error_count(&self) -> usize {
        self.results.iter().filter(|r| r.has_error()).count()
    }

    /// Results followed by the summary, as one list.
    pub fn into_results(self) -> Vec<ActionResult> {
        let mut results = self.results;
        results.push(self.summary);
        results
    }
}

/// Replays recorded histories against a live environment.
pub struct ReplayEngine {
    config: ReplayConfig,
    environment: Arc<dyn BrowserEnvironment>,
    executor: Arc<dyn ActionExecutor>,
    runner: MultiActRunner,
    matcher: ElementMatcher,
    failure_handler: Arc<dyn FailureHandler>,
    summarizer: Option<Arc<dyn RerunSummarizer>>,
    control: PauseStopController,
}

impl ReplayEngine {
    pub fn new(
        config: ReplayConfig,
        environment: Arc<dyn BrowserEnvironment>,
        executor: Arc<dyn ActionExecutor>,
    ) -> Self {
        let runner = MultiActRunner::new(executor.clone(), config.wait_between_actions());
        let failure_handler = Arc::new(DefaultFailureHandler::new(&config));
        Self {
            config,
            environment,
            executor,
            runner,
            matcher: ElementMatcher::new(),
            failure_handler,
            summarizer: None,
            control: PauseStopController::new(),
        }
    }

    pub fn with_failure_handler(mut self, handler: Arc<dyn FailureHandler>) -> Self {
        self.failure_handler = handler;
        self
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn RerunSummarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    /// Share pause/stop signals with another owner, e.g. a live run.
    pub fn with_control(mut self, control: PauseStopController) -> Self {
        self.control = control;
        self
    }

    pub fn control(&self) -> PauseStopController {
        self.control.clone()
    }

    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    /// Load a saved history, substitute variables if given, and replay it.
    pub async fn load_and_rerun(
        &self,
        path: impl AsRef<Path>,
        variables: Option<&BTreeMap<String, String>>,
    ) -> Result<ReplayReport, ReplayError> {
        let history = HistoryStore::load_from_file(path.as_ref())?;
        let history = match variables {
            Some(values) if !values.is_empty() => {
                let substitution = substitute_variables(&history, values)?;
                info!(replaced = substitution.replaced, "substituted variables");
                substitution.history
            }
            _ => history,
        };
        self.rerun(&history).await
    }

    /// Replay every record in order.
    pub async fn rerun(&self, history: &HistoryStore) -> Result<ReplayReport, ReplayError> {
        info!(records = history.len(), "replaying history");
        let mut results = Vec::new();
        let mut previous: Option<&StepRecord> = None;
        let mut previous_succeeded = false;

        for (i, record) in history.iter().enumerate() {
            let step_name = step_name(record, i);
            self.control.wait_while_paused().await;
            if self.control.is_stopped() {
                info!(step = %step_name, "replay stopped");
                return Err(ReplayError::Interrupted(Interrupt::Stopped));
            }
            info!(
                step = %step_name,
                goal = record.next_goal().unwrap_or_default(),
                "replaying step"
            );

            if record.actions().is_empty() {
                warn!(step = %step_name, "no action to replay, skipping");
                results.push(ActionResult::error(NO_ACTION_TO_REPLAY));
                continue;
            }

            if self.config.skip_failures {
                if let Some(original) = record.first_error() {
                    let truncated: String =
                        original.chars().take(MAX_ORIGINAL_ERROR_CHARS).collect();
                    info!(step = %step_name, "skipping step that failed originally");
                    results.push(ActionResult::error(format!(
                        "Skipped - original step had error: {truncated}"
                    )));
                    continue;
                }
            }

            if is_redundant_retry(&self.matcher, record, previous, previous_succeeded) {
                info!(step = %step_name, "skipping redundant retry of previous step");
                results.push(ActionResult::extracted(REDUNDANT_STEP_SKIPPED));
                continue;
            }

            let delay = self
                .config
                .step_delay(record.metadata.as_ref().and_then(|m| m.step_interval_ms));
            if !delay.is_zero() {
                debug!(step = %step_name, delay_ms = delay.as_millis() as u64, "pacing replay");
                sleep(delay).await;
            }

            let step_number = record.step_number().unwrap_or(i as u32);
            let mut attempt = 0;
            previous_succeeded = loop {
                let err = match self.replay_step(record, step_number).await {
                    Ok(step_results) => {
                        results.extend(step_results);
                        break true;
                    }
                    Err(ReplayError::Interrupted(Interrupt::Paused)) => {
                        self.control.wait_while_paused().await;
                        continue;
                    }
                    Err(err @ ReplayError::Interrupted(_)) => return Err(err),
                    Err(err) => err,
                };

                attempt += 1;
                match self
                    .failure_handler
                    .handle_failure(&step_name, &err, attempt)
                    .await
                {
                    FailureHandlerResult::Retry { .. } => continue,
                    FailureHandlerResult::Continue(message) => {
                        results.push(ActionResult::error(message));
                        break false;
                    }
                    FailureHandlerResult::Abort(message) => {
                        error!(step = %step_name, "{message}");
                        return Err(match err {
                            ReplayError::MatchFailure(source) => ReplayError::MatchFailure(source),
                            other => ReplayError::StepFailed {
                                step_name,
                                attempts: attempt,
                                reason: other.to_string(),
                            },
                        });
                    }
                }
            };
            previous = Some(record);
        }

        let summary = self.summarize(history, &results).await;
        info!(
            results = results.len(),
            errors = results.iter().filter(|r| r.has_error()).count(),
            success = ?summary.success,
            "replay finished"
        );
        Ok(ReplayReport { results, summary })
    }

    /// One attempt at one record.
    async fn replay_step(
        &self,
        record: &StepRecord,
        step_number: u32,
    ) -> Result<Vec<ActionResult>, ReplayError> {
        let mut snapshot = self.observe().await?;
        if self.config.wait_for_elements {
            let needed = expected_element_count(record.actions());
            if needed > snapshot.element_count() {
                snapshot = self.wait_for_elements(needed, snapshot).await?;
            }
        }

        let actions = self.matcher.remap_actions(
            record.actions(),
            &record.state.interacted_elements,
            &snapshot,
        )?;
        let ctx = ExecutionContext {
            step_number,
            available_file_paths: self.config.available_file_paths.clone(),
        };

        // Extraction reads the page as it is, so anything queued before it runs first.
        let mut results = Vec::with_capacity(actions.len());
        let mut pending_from = 0;
        for (i, action) in actions.iter().enumerate() {
            if action.kind() != ActionKind::Extract {
                continue;
            }
            self.run_batch(&actions[pending_from..i], &ctx, &mut results)
                .await?;
            self.control.check().map_err(ReplayError::Interrupted)?;
            let result = self.executor.execute(action, &ctx).await?;
            result.validate()?;
            if let Some(error) = &result.error {
                return Err(ReplayError::ActionFailed(error.clone()));
            }
            results.push(result);
            pending_from = i + 1;
        }
        self.run_batch(&actions[pending_from..], &ctx, &mut results)
            .await?;
        Ok(results)
    }

    async fn run_batch(
        &self,
        actions: &[AgentAction],
        ctx: &ExecutionContext,
        results: &mut Vec<ActionResult>,
    ) -> Result<(), ReplayError> {
        if actions.is_empty() {
            return Ok(());
        }
        let batch = self.runner.run(actions, ctx, &self.control).await?;
        if let Some(reason) = batch.interrupted {
            return Err(ReplayError::Interrupted(reason));
        }
        if let Some(error) = batch.results.iter().find_map(|r| r.error.clone()) {
            return Err(ReplayError::ActionFailed(error));
        }
        results.extend(batch.results);
        Ok(())
    }

    async fn observe(&self) -> Result<BrowserSnapshot, ReplayError> {
        Ok(self
            .environment
            .snapshot(SnapshotOptions {
                include_screenshot: false,
            })
            .await?)
    }

    /// Poll until the page shows at least `needed` elements or the wait
    /// times out. Either way the latest snapshot is returned.
    async fn wait_for_elements(
        &self,
        needed: usize,
        mut snapshot: BrowserSnapshot,
    ) -> Result<BrowserSnapshot, ReplayError> {
        let deadline = Instant::now() + self.config.element_wait_timeout();
        debug!(needed, visible = snapshot.element_count(), "waiting for elements");
        loop {
            if snapshot.element_count() >= needed {
                return Ok(snapshot);
            }
            if Instant::now() >= deadline {
                warn!(
                    needed,
                    visible = snapshot.element_count(),
                    "timed out waiting for elements"
                );
                return Ok(snapshot);
            }
            sleep(self.config.element_poll_interval()).await;
            snapshot = self.observe().await?;
        }
    }

    async fn summarize(&self, history: &HistoryStore, results: &[ActionResult]) -> ActionResult {
        if let Some(summarizer) = &self.summarizer {
            match summarizer.summarize(history, results).await {
                Ok(summary) if summary.is_done && summary.validate().is_ok() => return summary,
                Ok(_) => warn!("summarizer returned a non-terminal result, using fallback"),
                Err(err) => warn!(error = %err, "summarizer failed, using fallback"),
            }
        }
        fallback_summary(results)
    }
}

fn step_name(record: &StepRecord, position: usize) -> String {
    match record.step_number() {
        Some(0) => "Initial actions".to_string(),
        Some(n) => format!("Step {n}"),
        None => format!("Step {}", position + 1),
    }
}

/// Element count a record needs visible: one past its highest target index.
fn expected_element_count(actions: &[AgentAction]) -> usize {
    actions
        .iter()
        .filter_map(AgentAction::element_index)
        .max()
        .map(|index| (index as usize + 1).min(MAX_EXPECTED_ELEMENTS))
        .unwrap_or(0)
}
