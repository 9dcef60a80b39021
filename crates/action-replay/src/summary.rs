//! The synthesized record that closes a replay.

use action_primitives::ActionResult;
use agent_core::HistoryStore;
use async_trait::async_trait;

use crate::errors::ReplayError;

/// Produces the final result of a replay from everything it recorded.
#[async_trait]
pub trait RerunSummarizer: Send + Sync {
    async fn summarize(
        &self,
        history: &HistoryStore,
        results: &[ActionResult],
    ) -> Result<ActionResult, ReplayError>;
}

/// Deterministic summary: successful only if no result carries an error.
pub fn fallback_summary(results: &[ActionResult]) -> ActionResult {
    let total = results.len();
    let errors = results.iter().filter(|r| r.has_error()).count();
    let succeeded = total - errors;
    ActionResult::done(
        errors == 0,
        format!("Rerun completed: {succeeded}/{total} steps succeeded"),
    )
    .with_memory(format!(
        "Rerun completed with {errors} error(s) out of {total} result(s)"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_counts_errors() {
        let results = vec![
            ActionResult::extracted("ok"),
            ActionResult::error("Step 2 failed after 3 attempts: gone"),
            ActionResult::default(),
        ];

        let summary = fallback_summary(&results);

        assert!(summary.is_done);
        assert_eq!(summary.success, Some(false));
        assert_eq!(
            summary.extracted_content.as_deref(),
            Some("Rerun completed: 2/3 steps succeeded")
        );
        assert!(summary.validate().is_ok());
    }

    #[test]
    fn fallback_without_errors_is_successful() {
        let summary = fallback_summary(&[ActionResult::extracted("ok")]);
        assert_eq!(summary.success, Some(true));
    }
}
