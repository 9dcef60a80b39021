//! Per-action outcomes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ActionError;

/// Verdict attached to the final result of a judged run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JudgementResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    pub verdict: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(default)]
    pub impossible_task: bool,
    #[serde(default)]
    pub reached_captcha: bool,
}

/// Outcome of executing one action.
///
/// `success` may only be `Some(true)` when `is_done` is set; see
/// [`ActionResult::validate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    #[serde(default)]
    pub is_done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judgement: Option<JudgementResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_term_memory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_content: Option<String>,
    #[serde(default)]
    pub include_extracted_content_only_once: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl ActionResult {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn extracted(content: impl Into<String>) -> Self {
        Self {
            extracted_content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn done(success: bool, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            is_done: true,
            success: Some(success),
            long_term_memory: Some(format!("Task completed: {success} - {text}")),
            extracted_content: Some(text),
            ..Self::default()
        }
    }

    pub fn with_memory(mut self, memory: impl Into<String>) -> Self {
        self.long_term_memory = Some(memory.into());
        self
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Reject results claiming success without being terminal.
    pub fn validate(&self) -> Result<(), ActionError> {
        if self.success == Some(true) && !self.is_done {
            return Err(ActionError::InvalidResult(
                "success=true can only be set when is_done=true".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_requires_done() {
        let bogus = ActionResult {
            success: Some(true),
            ..ActionResult::default()
        };
        assert!(bogus.validate().is_err());
        assert!(ActionResult::done(true, "finished").validate().is_ok());
        assert!(ActionResult::error("boom").validate().is_ok());
    }

    #[test]
    fn minimal_result_serializes_compactly() {
        let value = serde_json::to_value(ActionResult::extracted("42")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "is_done": false,
                "extracted_content": "42",
                "include_extracted_content_only_once": false
            })
        );
    }
}
