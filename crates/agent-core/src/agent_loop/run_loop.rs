//! Run-level driver: repeats steps until completion, a limit, or a stop.

use std::time::Instant;

use action_primitives::{ActionResult, AgentAction, ExecutionContext};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::control::Interrupt;
use super::controller::{AgentLoopController, StepStatus};
use super::types::AgentOutput;
use crate::history::{HistoryStore, StateDigest, StepMetadata, StepRecord};

/// Error recorded when the step budget runs out.
pub const MAX_STEPS_ERROR: &str = "Failed to complete task in maximum steps";

/// How a run ended. Exactly one per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Termination {
    Completed,
    FailedStepLimit,
    FailedConsecutiveErrors,
    Stopped,
    Interrupted,
}

impl Termination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Termination::Completed => "completed",
            Termination::FailedStepLimit => "failed-step-limit",
            Termination::FailedConsecutiveErrors => "failed-consecutive-errors",
            Termination::Stopped => "stopped",
            Termination::Interrupted => "interrupted",
        }
    }
}

/// Result of an agent run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub termination: Termination,
    /// Success flag of the terminal result, if the run reached one.
    pub success: Option<bool>,
    pub steps_taken: u32,
    pub total_time_ms: u64,
    pub history: HistoryStore,
}

impl RunOutcome {
    /// Check if the run completed and reported success.
    pub fn is_success(&self) -> bool {
        self.termination == Termination::Completed && self.success == Some(true)
    }

    pub fn final_result(&self) -> Option<&str> {
        self.history.final_result()
    }
}

impl AgentLoopController {
    /// Run steps until the task is done, the step budget or failure budget
    /// is spent, or the run is stopped.
    pub async fn run(&mut self) -> RunOutcome {
        let started = Instant::now();
        info!(agent = %self.id, task_id = %self.task_id, task = %self.task, max_steps = self.config.max_steps, "starting agent run");

        self.execute_initial_actions().await;

        let termination = loop {
            if self.state.n_steps >= self.config.max_steps {
                break None;
            }

            if self.control.is_paused() {
                info!(step = self.state.n_steps + 1, "run paused, waiting for resume");
                self.control.wait_while_paused().await;
            }

            let failure_limit = self.config.failure_limit();
            if self.state.consecutive_failures >= failure_limit {
                error!(
                    failures = self.state.consecutive_failures,
                    limit = failure_limit,
                    "stopping run after too many consecutive failures"
                );
                break Some(Termination::FailedConsecutiveErrors);
            }

            if self.control.is_stopped() {
                info!("run stopped");
                break Some(Termination::Stopped);
            }

            self.hooks.on_step_start(&self.state, &self.history).await;
            match self.step().await {
                StepStatus::Recorded => {}
                StepStatus::Interrupted(Interrupt::Paused) => continue,
                StepStatus::Interrupted(Interrupt::Stopped) => {
                    info!("run stopped during a step");
                    break Some(Termination::Interrupted);
                }
            }
            self.hooks.on_step_end(&self.state, &self.history).await;

            if self.history.is_done() {
                self.judge_trace().await;
                break Some(Termination::Completed);
            }
        };

        let termination = termination.unwrap_or_else(|| {
            self.record_step_limit();
            Termination::FailedStepLimit
        });

        let outcome = RunOutcome {
            termination,
            success: self.history.is_successful(),
            steps_taken: self.state.n_steps,
            total_time_ms: started.elapsed().as_millis() as u64,
            history: self.history.clone(),
        };
        info!(
            termination = termination.as_str(),
            success = ?outcome.success,
            steps = outcome.steps_taken,
            "agent run finished"
        );
        outcome
    }

    async fn execute_initial_actions(&mut self) {
        if self.initial_actions.is_empty() || self.state.follow_up_task {
            return;
        }
        debug!(count = self.initial_actions.len(), "executing initial actions");

        let started_at = Utc::now();
        let ctx = ExecutionContext {
            step_number: 0,
            available_file_paths: self.config.available_file_paths.clone(),
        };
        let results = match self
            .multi_act
            .run(&self.initial_actions, &ctx, &self.control)
            .await
        {
            Ok(batch) => {
                if let Some(reason) = batch.interrupted {
                    debug!(%reason, "initial actions interrupted");
                }
                batch.results
            }
            Err(err) => {
                warn!(error = %err, "initial actions failed");
                vec![ActionResult::error(err.to_string())]
            }
        };
        self.state.last_results = results.clone();

        let url = self
            .initial_actions
            .iter()
            .find_map(|action| match action {
                AgentAction::Navigate { url, .. } => Some(url.clone()),
                _ => None,
            })
            .unwrap_or_default();
        let output = AgentOutput {
            evaluation_previous_goal: Some("Start".to_string()),
            next_goal: Some("Initial navigation".to_string()),
            actions: self.initial_actions.clone(),
            ..AgentOutput::default()
        };
        self.history.push(StepRecord {
            model_output: Some(output),
            result: results,
            state: StateDigest {
                url,
                title: "Initial Actions".to_string(),
                interacted_elements: vec![None; self.initial_actions.len()],
                ..StateDigest::default()
            },
            metadata: Some(StepMetadata {
                step_number: 0,
                step_start_time: started_at,
                step_end_time: Utc::now(),
                step_interval_ms: None,
            }),
        });
    }

    fn record_step_limit(&mut self) {
        warn!(max_steps = self.config.max_steps, "{MAX_STEPS_ERROR}");
        let result = ActionResult::error(MAX_STEPS_ERROR);
        self.state.last_results = vec![result.clone()];
        self.history.push(StepRecord {
            model_output: None,
            result: vec![result],
            state: StateDigest::default(),
            metadata: None,
        });
    }

    async fn judge_trace(&mut self) {
        if !self.config.use_judge {
            return;
        }
        let Some(judge) = self.judge.clone() else {
            return;
        };
        match judge.judge(&self.task, &self.history).await {
            Ok(judgement) => {
                info!(verdict = judgement.verdict, "trace judged");
                self.history.attach_judgement(judgement);
            }
            Err(err) => warn!(error = %err, "trace judge failed"),
        }
    }
}

