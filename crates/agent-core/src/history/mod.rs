//! Append-only record of a run, and its persisted form.

mod document;
pub mod record;
pub mod redaction;

pub use record::{StateDigest, StepMetadata, StepRecord};
pub use redaction::{Redactor, SensitiveData, SensitiveValue};

use action_primitives::{AgentAction, JudgementResult};
use serde::{Deserialize, Serialize};

use crate::agent_loop::AgentOutput;

/// Ordered step records of one run.
///
/// Records are only ever appended. The single permitted in-place change is
/// attaching a judgement to the last result of the final record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryStore {
    history: Vec<StepRecord>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<StepRecord>) -> Self {
        Self { history: records }
    }

    pub fn push(&mut self, record: StepRecord) {
        self.history.push(record);
    }

    pub fn records(&self) -> &[StepRecord] {
        &self.history
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepRecord> {
        self.history.iter()
    }

    pub fn last(&self) -> Option<&StepRecord> {
        self.history.last()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn number_of_steps(&self) -> usize {
        self.history.len()
    }

    /// Sum of per-record durations, in milliseconds.
    pub fn total_duration_ms(&self) -> u64 {
        self.history
            .iter()
            .filter_map(|record| record.metadata.as_ref())
            .map(StepMetadata::duration_ms)
            .sum()
    }

    pub fn is_done(&self) -> bool {
        self.last().is_some_and(StepRecord::is_done)
    }

    /// Success flag of the terminal result; `None` until the run is done.
    pub fn is_successful(&self) -> Option<bool> {
        let last = self.last()?.result.last()?;
        if last.is_done {
            Some(last.success.unwrap_or(false))
        } else {
            None
        }
    }

    pub fn final_result(&self) -> Option<&str> {
        self.last()?.result.last()?.extracted_content.as_deref()
    }

    /// One slot per record: the first error of that step, if any.
    pub fn errors(&self) -> Vec<Option<&str>> {
        self.history.iter().map(StepRecord::first_error).collect()
    }

    pub fn has_errors(&self) -> bool {
        self.history.iter().any(StepRecord::has_error)
    }

    pub fn urls(&self) -> Vec<Option<&str>> {
        self.history
            .iter()
            .map(|record| Some(record.state.url.as_str()).filter(|url| !url.is_empty()))
            .collect()
    }

    pub fn action_names(&self) -> Vec<&'static str> {
        self.history
            .iter()
            .flat_map(|record| record.actions().iter().map(AgentAction::name))
            .collect()
    }

    pub fn model_actions(&self) -> Vec<&AgentAction> {
        self.history.iter().flat_map(|r| r.actions()).collect()
    }

    pub fn extracted_content(&self) -> Vec<&str> {
        self.history
            .iter()
            .flat_map(|record| record.result.iter())
            .filter_map(|result| result.extracted_content.as_deref())
            .collect()
    }

    pub fn last_action(&self) -> Option<&AgentAction> {
        self.history.iter().rev().find_map(|r| r.actions().last())
    }

    pub fn model_outputs(&self) -> Vec<&AgentOutput> {
        self.history
            .iter()
            .filter_map(|record| record.model_output.as_ref())
            .collect()
    }

    pub fn judgement(&self) -> Option<&JudgementResult> {
        self.last()?.result.last()?.judgement.as_ref()
    }

    /// Attach a verdict to the last result of the final record.
    /// Returns false when there is nothing to attach it to.
    pub fn attach_judgement(&mut self, judgement: JudgementResult) -> bool {
        match self.history.last_mut().and_then(|r| r.result.last_mut()) {
            Some(result) => {
                result.judgement = Some(judgement);
                true
            }
            None => false,
        }
    }
}
