//! Detection of duplicated steps in a recorded history.
//!
//! A slow page in the original run often makes the agent repeat an action
//! on the same element. Replaying both copies would act twice, so the
//! second copy is skipped when the first one replayed cleanly.

use action_locator::ElementMatcher;
use agent_core::StepRecord;
use tracing::debug;

/// True when `current` repeats `previous` on the same element with the same
/// action kind, and `previous` replayed without errors.
pub fn is_redundant_retry(
    matcher: &ElementMatcher,
    current: &StepRecord,
    previous: Option<&StepRecord>,
    previous_succeeded: bool,
) -> bool {
    let Some(previous) = previous else {
        return false;
    };
    if !previous_succeeded {
        return false;
    }

    let first_element = |record: &StepRecord| {
        record
            .state
            .interacted_elements
            .first()
            .cloned()
            .flatten()
    };
    let (Some(current_element), Some(previous_element)) =
        (first_element(current), first_element(previous))
    else {
        return false;
    };
    let Some(level) = matcher.same_element(&current_element, &previous_element) else {
        return false;
    };

    let (Some(current_action), Some(previous_action)) =
        (current.actions().first(), previous.actions().first())
    else {
        return false;
    };
    if current_action.kind() != previous_action.kind() {
        return false;
    }

    debug!(
        level = level.name(),
        action = current_action.name(),
        "step repeats the previous one"
    );
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_primitives::AgentAction;
    use agent_core::{AgentOutput, StateDigest};
    use steptrail_core_types::ElementIdentity;

    fn record(action: AgentAction, element: Option<ElementIdentity>) -> StepRecord {
        StepRecord {
            model_output: Some(AgentOutput::with_actions(vec![action])),
            result: Vec::new(),
            state: StateDigest {
                interacted_elements: vec![element],
                ..StateDigest::default()
            },
            metadata: None,
        }
    }

    fn submit() -> ElementIdentity {
        ElementIdentity::new("button", "/html/body/form/button", [("id", "submit")])
    }

    #[test]
    fn same_click_after_success_is_redundant() {
        let matcher = ElementMatcher::new();
        let first = record(AgentAction::click(4), Some(submit()));
        let second = record(AgentAction::click(9), Some(submit()));

        assert!(is_redundant_retry(&matcher, &second, Some(&first), true));
        assert!(!is_redundant_retry(&matcher, &second, Some(&first), false));
        assert!(!is_redundant_retry(&matcher, &second, None, true));
    }

    #[test]
    fn different_kind_or_element_is_not_redundant() {
        let matcher = ElementMatcher::new();
        let click = record(AgentAction::click(4), Some(submit()));
        let input = record(AgentAction::input(4, "x"), Some(submit()));
        let other = record(
            AgentAction::click(5),
            Some(ElementIdentity::new("a", "/html/body/a", [("href", "/help")])),
        );
        let untargeted = record(AgentAction::navigate("https://example.com"), None);

        assert!(!is_redundant_retry(&matcher, &input, Some(&click), true));
        assert!(!is_redundant_retry(&matcher, &other, Some(&click), true));
        assert!(!is_redundant_retry(&matcher, &untargeted, Some(&untargeted), true));
    }
}
