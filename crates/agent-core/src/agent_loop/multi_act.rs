//! Sequential execution of the actions chosen in one decision.

use std::sync::Arc;
use std::time::Duration;

use action_primitives::{ActionError, ActionExecutor, ActionResult, AgentAction, ExecutionContext};
use tracing::{debug, info};

use super::control::{Interrupt, PauseStopController};

/// Results of one batch, in execution order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    pub results: Vec<ActionResult>,
    /// Set when a pause/stop was observed before an action could start.
    pub interrupted: Option<Interrupt>,
}

/// Runs a batch of actions with the short-circuit rules of a single step.
///
/// The returned results are a prefix of the batch: execution stops before a
/// `done` that is not the first action, and after any result that is
/// terminal or carries an error.
#[derive(Clone)]
pub struct MultiActRunner {
    executor: Arc<dyn ActionExecutor>,
    wait_between: Duration,
}

impl MultiActRunner {
    pub fn new(executor: Arc<dyn ActionExecutor>, wait_between: Duration) -> Self {
        Self {
            executor,
            wait_between,
        }
    }

    pub async fn run(
        &self,
        actions: &[AgentAction],
        ctx: &ExecutionContext,
        control: &PauseStopController,
    ) -> Result<BatchOutcome, ActionError> {
        let mut outcome = BatchOutcome {
            results: Vec::with_capacity(actions.len()),
            interrupted: None,
        };
        let total = actions.len();

        for (i, action) in actions.iter().enumerate() {
            if i > 0 && action.is_done() {
                debug!(
                    executed = i,
                    "done is only valid as a single action, stopping before it"
                );
                break;
            }

            if i > 0 && !self.wait_between.is_zero() {
                tokio::time::sleep(self.wait_between).await;
            }

            if let Err(reason) = control.check() {
                debug!(action = i, %reason, "batch interrupted");
                outcome.interrupted = Some(reason);
                return Ok(outcome);
            }

            let result = self.executor.execute(action, ctx).await?;
            result.validate()?;

            let last = i + 1 == total;
            let stop = result.is_done || result.has_error() || last;
            match &result.error {
                Some(error) => info!(action = action.name(), %error, "executed action {}/{}", i + 1, total),
                None => debug!(action = action.name(), "executed action {}/{}", i + 1, total),
            }
            outcome.results.push(result);

            if stop {
                break;
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use proptest::prelude::*;
    use std::sync::Mutex;

    /// Executor whose results are keyed by click index: 0 ok, 1 error, 2 done.
    #[derive(Default)]
    struct ScriptedExecutor {
        seen: Mutex<Vec<AgentAction>>,
    }

    #[async_trait]
    impl ActionExecutor for ScriptedExecutor {
        async fn execute(
            &self,
            action: &AgentAction,
            _ctx: &ExecutionContext,
        ) -> Result<ActionResult, ActionError> {
            self.seen.lock().unwrap().push(action.clone());
            Ok(match action {
                AgentAction::Done { success, text, .. } => ActionResult::done(*success, text.clone()),
                AgentAction::Click { index: 1 } => ActionResult::error("element vanished"),
                AgentAction::Click { index: 2 } => ActionResult::done(false, "gave up"),
                _ => ActionResult::default(),
            })
        }
    }

    fn runner() -> (MultiActRunner, Arc<ScriptedExecutor>) {
        let executor = Arc::new(ScriptedExecutor::default());
        (MultiActRunner::new(executor.clone(), Duration::ZERO), executor)
    }

    #[tokio::test]
    async fn stops_before_done_at_later_position() {
        let (runner, executor) = runner();
        let batch = vec![AgentAction::click(0), AgentAction::done(true, "finished")];

        let outcome = runner
            .run(&batch, &ExecutionContext::default(), &PauseStopController::new())
            .await
            .unwrap();

        assert_eq!(outcome.results.len(), 1);
        assert!(!outcome.results[0].is_done);
        assert_eq!(executor.seen.lock().unwrap().as_slice(), &batch[..1]);
    }

    #[tokio::test]
    async fn stops_after_first_error() {
        let (runner, _) = runner();
        let batch = vec![AgentAction::click(1), AgentAction::click(0)];

        let outcome = runner
            .run(&batch, &ExecutionContext::default(), &PauseStopController::new())
            .await
            .unwrap();

        assert_eq!(outcome.results.len(), 1);
        assert!(outcome.results[0].has_error());
    }

    #[tokio::test]
    async fn paused_batch_executes_nothing() {
        let (runner, executor) = runner();
        let control = PauseStopController::new();
        control.pause();

        let outcome = runner
            .run(&[AgentAction::click(0)], &ExecutionContext::default(), &control)
            .await
            .unwrap();

        assert_eq!(outcome.interrupted, Some(Interrupt::Paused));
        assert!(outcome.results.is_empty());
        assert!(executor.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn success_without_done_is_a_contract_violation() {
        struct Liar;

        #[async_trait]
        impl ActionExecutor for Liar {
            async fn execute(
                &self,
                _action: &AgentAction,
                _ctx: &ExecutionContext,
            ) -> Result<ActionResult, ActionError> {
                Ok(ActionResult {
                    success: Some(true),
                    ..ActionResult::default()
                })
            }
        }

        let runner = MultiActRunner::new(Arc::new(Liar), Duration::ZERO);
        let err = runner
            .run(&[AgentAction::click(0)], &ExecutionContext::default(), &PauseStopController::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::InvalidResult(_)));
    }

    fn arb_action() -> impl Strategy<Value = AgentAction> {
        prop_oneof![
            (0u32..3).prop_map(AgentAction::click),
            any::<bool>().prop_map(|success| AgentAction::done(success, "end")),
            Just(AgentAction::navigate("https://example.com")),
        ]
    }

    proptest! {
        #[test]
        fn results_are_an_executed_prefix(batch in prop::collection::vec(arb_action(), 0..8)) {
            let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
            let (runner, executor) = runner();
            let outcome = rt
                .block_on(runner.run(&batch, &ExecutionContext::default(), &PauseStopController::new()))
                .unwrap();

            let seen = executor.seen.lock().unwrap().clone();
            prop_assert!(outcome.results.len() <= batch.len());
            prop_assert_eq!(outcome.results.len(), seen.len());
            prop_assert_eq!(&seen[..], &batch[..seen.len()]);

            let terminal: Vec<usize> = outcome
                .results
                .iter()
                .enumerate()
                .filter(|(_, r)| r.is_done)
                .map(|(i, _)| i)
                .collect();
            prop_assert!(terminal.len() <= 1);
            if let Some(&pos) = terminal.first() {
                prop_assert_eq!(pos, outcome.results.len() - 1);
            }
            for (i, action) in seen.iter().enumerate() {
                if action.is_done() {
                    prop_assert_eq!(i, 0);
                }
            }
        }
    }
}
