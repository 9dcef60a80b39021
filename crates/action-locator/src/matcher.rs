//! Element matcher with cascading fallback levels

use std::collections::BTreeMap;

use action_primitives::{AgentAction, BrowserSnapshot};
use steptrail_core_types::{ElementIdentity, IDENTIFYING_ATTRIBUTES};
use tracing::{debug, info, warn};

use crate::{errors::LocatorError, types::*};

/// Most same-kind candidates listed in a no-match diagnostic.
const MAX_NEARBY_CANDIDATES: usize = 5;

/// Re-identifies recorded elements inside a fresh element index.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElementMatcher;

impl ElementMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Try every level in order and return the first hit.
    pub fn match_element(
        &self,
        historical: &ElementIdentity,
        current: &BTreeMap<u32, ElementIdentity>,
    ) -> Option<MatchOutcome> {
        for level in MatchLevel::cascade() {
            if let Some(outcome) = self.match_at(level, historical, current) {
                debug!(
                    index = outcome.index,
                    level = level.name(),
                    node = %historical.node_name,
                    "element matched"
                );
                return Some(outcome);
            }
            debug!(level = level.name(), "no match at level");
        }
        None
    }

    /// Try a single level of the cascade.
    pub fn match_at(
        &self,
        level: MatchLevel,
        historical: &ElementIdentity,
        current: &BTreeMap<u32, ElementIdentity>,
    ) -> Option<MatchOutcome> {
        match level {
            MatchLevel::Exact => current
                .iter()
                .find(|(_, candidate)| candidate.element_hash == historical.element_hash)
                .map(|(index, _)| MatchOutcome::new(*index, level)),
            MatchLevel::Stable => {
                let wanted = historical
                    .stable_hash
                    .unwrap_or_else(|| historical.compute_stable_hash());
                current
                    .iter()
                    .find(|(_, candidate)| candidate.compute_stable_hash() == wanted)
                    .map(|(index, _)| MatchOutcome::new(*index, level))
            }
            MatchLevel::Xpath => {
                if historical.xpath.is_empty() {
                    return None;
                }
                current
                    .iter()
                    .find(|(_, candidate)| candidate.xpath == historical.xpath)
                    .map(|(index, _)| MatchOutcome::new(*index, level))
            }
            MatchLevel::Attribute => attribute_match(historical, current),
        }
    }

    /// Like [`match_element`](Self::match_element), but a miss becomes a
    /// diagnostic error naming the action it belongs to.
    pub fn resolve(
        &self,
        action_index: usize,
        historical: &ElementIdentity,
        current: &BTreeMap<u32, ElementIdentity>,
    ) -> Result<MatchOutcome, LocatorError> {
        self.match_element(historical, current).ok_or_else(|| {
            let err = LocatorError::NoMatch {
                action_index,
                looking_for: historical.describe(),
                element_count: current.len(),
                nearby: nearby_candidates(historical, current),
            };
            warn!(action = action_index, node = %historical.node_name, "element not found in current page");
            err
        })
    }

    /// Whether two recorded identities denote the same element, and at
    /// which level. ATTRIBUTE is not considered since it needs a whole index.
    pub fn same_element(&self, a: &ElementIdentity, b: &ElementIdentity) -> Option<MatchLevel> {
        MatchLevel::identity_levels()
            .into_iter()
            .find(|level| match level {
                MatchLevel::Exact => a.element_hash == b.element_hash,
                MatchLevel::Stable => match (a.stable_hash, b.stable_hash) {
                    (Some(x), Some(y)) => x == y,
                    _ => false,
                },
                MatchLevel::Xpath => !a.xpath.is_empty() && a.xpath == b.xpath,
                MatchLevel::Attribute => false,
            })
    }

    /// Point each action at the current index of the element it originally
    /// targeted. Actions without a recorded element are kept as they are.
    pub fn remap_actions(
        &self,
        actions: &[AgentAction],
        recorded: &[Option<ElementIdentity>],
        snapshot: &BrowserSnapshot,
    ) -> Result<Vec<AgentAction>, LocatorError> {
        let mut remapped = Vec::with_capacity(actions.len());
        for (i, action) in actions.iter().enumerate() {
            let Some(historical) = recorded.get(i).and_then(Option::as_ref) else {
                remapped.push(action.clone());
                continue;
            };

            let outcome = self.resolve(i, historical, &snapshot.elements)?;
            let mut updated = action.clone();
            let old_index = updated.element_index();
            if !updated.set_element_index(outcome.index) {
                return Err(LocatorError::NotRemappable {
                    action_index: i,
                    action: action.name(),
                });
            }
            if old_index != Some(outcome.index) {
                info!(
                    action = i,
                    from = ?old_index,
                    to = outcome.index,
                    level = outcome.level.name(),
                    "element moved"
                );
            }
            remapped.push(updated);
        }
        Ok(remapped)
    }
}

/// First identifying attribute, in priority order, that is set on the
/// recorded element and unique among same-kind candidates.
fn attribute_match(
    historical: &ElementIdentity,
    current: &BTreeMap<u32, ElementIdentity>,
) -> Option<MatchOutcome> {
    let kind = historical.node_kind();
    for key in IDENTIFYING_ATTRIBUTES {
        let Some(wanted) = historical.attribute(key) else {
            continue;
        };
        let mut hits = current
            .iter()
            .filter(|(_, candidate)| candidate.node_kind() == kind)
            .filter(|(_, candidate)| candidate.attribute(key) == Some(wanted));
        match (hits.next(), hits.next()) {
            (Some((index, _)), None) => {
                return Some(MatchOutcome {
                    index: *index,
                    level: MatchLevel::Attribute,
                    attribute: Some(key.to_string()),
                })
            }
            (Some(_), Some(_)) => debug!(attribute = key, "attribute value is ambiguous"),
            _ => {}
        }
    }
    None
}

fn nearby_candidates(historical: &ElementIdentity, current: &BTreeMap<u32, ElementIdentity>) -> String {
    let kind = historical.node_kind();
    let same_kind: Vec<(&u32, &ElementIdentity)> = current
        .iter()
        .filter(|(_, candidate)| candidate.node_kind() == kind)
        .collect();
    if same_kind.is_empty() {
        return String::new();
    }

    let labelled: Vec<String> = same_kind
        .iter()
        .filter_map(|(index, candidate)| {
            candidate
                .attribute("aria-label")
                .map(|label| format!("{index}:{label}"))
        })
        .take(MAX_NEARBY_CANDIDATES)
        .collect();
    if labelled.is_empty() {
        format!(
            "\n  Found {} <{}> elements (none with matching identifiers)",
            same_kind.len(),
            historical.node_name
        )
    } else {
        format!(
            "\n  Available <{}> with aria-label: [{}]",
            historical.node_name,
            labelled.join(", ")
        )
    }
}
