//! Detection of user-supplied literals in a history and their substitution
//! for reruns with different data.

use std::collections::BTreeMap;

use action_primitives::AgentAction;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use steptrail_core_types::ElementIdentity;
use tracing::{debug, warn};

use crate::errors::HistoryError;
use crate::history::HistoryStore;

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap());
static PHONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 ().-]{5,}[0-9]$").unwrap());
static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?[0-9]+(\.[0-9]+)?$").unwrap());
static DATE_FORMATS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap(), "YYYY-MM-DD"),
        (Regex::new(r"^\d{2}/\d{2}/\d{4}$").unwrap(), "MM/DD/YYYY"),
        (Regex::new(r"^\d{2}\.\d{2}\.\d{4}$").unwrap(), "DD.MM.YYYY"),
    ]
});
static NON_IDENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableType {
    Email,
    Phone,
    Date,
    Number,
    Text,
}

impl VariableType {
    fn default_name(&self) -> &'static str {
        match self {
            VariableType::Email => "email",
            VariableType::Phone => "phone",
            VariableType::Date => "date",
            VariableType::Number => "number",
            VariableType::Text => "text",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedVariable {
    pub name: String,
    pub original_value: String,
    #[serde(rename = "type")]
    pub var_type: VariableType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// Result of [`substitute_variables`]: a new store plus the number of
/// literals that were replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct Substitution {
    pub history: HistoryStore,
    pub replaced: usize,
}

fn classify(value: &str, element: Option<&ElementIdentity>) -> (VariableType, Option<String>) {
    if EMAIL.is_match(value) {
        return (VariableType::Email, None);
    }
    if let Some((_, format)) = DATE_FORMATS.iter().find(|(re, _)| re.is_match(value)) {
        return (VariableType::Date, Some((*format).to_string()));
    }
    let input_type = element.and_then(|e| e.attribute("type"));
    let digits = value.chars().filter(char::is_ascii_digit).count();
    if PHONE.is_match(value) && (7..=15).contains(&digits) && (input_type == Some("tel") || !NUMBER.is_match(value)) {
        return (VariableType::Phone, None);
    }
    if NUMBER.is_match(value) {
        return (VariableType::Number, None);
    }
    (VariableType::Text, None)
}

fn element_name(element: Option<&ElementIdentity>) -> Option<String> {
    let element = element?;
    ["name", "id", "aria-label", "placeholder"]
        .iter()
        .find_map(|key| element.attribute(key))
        .map(|raw| {
            NON_IDENT
                .replace_all(&raw.to_ascii_lowercase(), "_")
                .trim_matches('_')
                .to_string()
        })
        .filter(|name| !name.is_empty())
}

/// Inspect text-input actions and name the literals a rerun might change.
///
/// Each distinct value is reported once, keyed by a unique name.
pub fn detect_variables(history: &HistoryStore) -> BTreeMap<String, DetectedVariable> {
    let mut detected: BTreeMap<String, DetectedVariable> = BTreeMap::new();

    for record in history.iter() {
        for (i, action) in record.actions().iter().enumerate() {
            let AgentAction::Input { text, .. } = action else {
                continue;
            };
            if text.trim().is_empty() || detected.values().any(|v| &v.original_value == text) {
                continue;
            }
            let element = record.state.interacted_elements.get(i).and_then(Option::as_ref);
            let (var_type, format) = classify(text, element);
            let base = match var_type {
                VariableType::Text => element_name(element).unwrap_or_else(|| "text".to_string()),
                other => element_name(element)
                    .filter(|name| name.contains(other.default_name()))
                    .unwrap_or_else(|| other.default_name().to_string()),
            };

            let mut name = base.clone();
            let mut suffix = 2;
            while detected.contains_key(&name) {
                name = format!("{base}_{suffix}");
                suffix += 1;
            }
            debug!(%name, ?var_type, "detected variable");
            detected.insert(
                name.clone(),
                DetectedVariable {
                    name,
                    original_value: text.clone(),
                    var_type,
                    format,
                },
            );
        }
    }

    detected
}

/// Each string is looked up once, so a new value is never rewritten by a
/// later replacement.
fn replace_exact(value: &mut Value, replacements: &BTreeMap<&str, &str>) -> usize {
    match value {
        Value::String(text) => match replacements.get(text.as_str()) {
            Some(to) => {
                *text = (*to).to_string();
                1
            }
            None => 0,
        },
        Value::Array(items) => items.iter_mut().map(|v| replace_exact(v, replacements)).sum(),
        Value::Object(map) => map.values_mut().map(|v| replace_exact(v, replacements)).sum(),
        _ => 0,
    }
}

/// Produce a copy of `history` whose action parameters use new values for
/// the named variables. Unknown names are skipped with a warning.
pub fn substitute_variables(
    history: &HistoryStore,
    values: &BTreeMap<String, String>,
) -> Result<Substitution, HistoryError> {
    let detected = detect_variables(history);
    let mut replacements: BTreeMap<&str, &str> = BTreeMap::new();
    for (name, new_value) in values {
        match detected.get(name) {
            Some(variable) => {
                replacements.insert(variable.original_value.as_str(), new_value.as_str());
            }
            None => warn!(%name, "variable not found in history, skipping"),
        }
    }

    let mut replaced = 0;
    let mut records = history.records().to_vec();
    for record in &mut records {
        let Some(output) = record.model_output.as_mut() else {
            continue;
        };
        for action in &mut output.actions {
            let mut value = serde_json::to_value(&*action)?;
            let changed = replace_exact(&mut value, &replacements);
            if changed > 0 {
                *action = serde_json::from_value(value)?;
                replaced += changed;
            }
        }
    }

    Ok(Substitution {
        history: HistoryStore::from_records(records),
        replaced,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent_loop::AgentOutput;
    use crate::history::{StateDigest, StepRecord};
    use pretty_assertions::assert_eq;

    fn input_record(pairs: &[(&str, Option<ElementIdentity>)]) -> StepRecord {
        StepRecord {
            model_output: Some(AgentOutput::with_actions(
                pairs
                    .iter()
                    .enumerate()
                    .map(|(i, (text, _))| AgentAction::input(i as u32, *text))
                    .collect(),
            )),
            result: Vec::new(),
            state: StateDigest {
                interacted_elements: pairs.iter().map(|(_, e)| e.clone()).collect(),
                ..StateDigest::default()
            },
            metadata: None,
        }
    }

    fn field(name: &str) -> Option<ElementIdentity> {
        Some(ElementIdentity::new("input", "/html/body/input", [("name", name)]))
    }

    #[test]
    fn classifies_common_literals() {
        let history = HistoryStore::from_records(vec![input_record(&[
            ("jane@example.com", None),
            ("2026-10-16", None),
            ("+1 (555) 010-9999", None),
            ("42", None),
            ("Jane", field("first-name")),
        ])]);

        let detected = detect_variables(&history);

        assert_eq!(detected["email"].var_type, VariableType::Email);
        assert_eq!(detected["date"].format.as_deref(), Some("YYYY-MM-DD"));
        assert_eq!(detected["phone"].var_type, VariableType::Phone);
        assert_eq!(detected["number"].original_value, "42");
        assert_eq!(detected["first_name"].var_type, VariableType::Text);
    }

    #[test]
    fn duplicate_names_get_suffixes_and_repeated_values_are_skipped() {
        let history = HistoryStore::from_records(vec![
            input_record(&[("alpha", None), ("beta", None)]),
            input_record(&[("alpha", None)]),
        ]);
        let detected = detect_variables(&history);
        assert_eq!(detected.len(), 2);
        assert_eq!(detected["text"].original_value, "alpha");
        assert_eq!(detected["text_2"].original_value, "beta");
    }

    #[test]
    fn substitution_returns_new_store() {
        let history = HistoryStore::from_records(vec![input_record(&[
            ("jane@example.com", field("email")),
        ])]);
        let mut values = BTreeMap::new();
        values.insert("email".to_string(), "joe@example.org".to_string());
        values.insert("missing".to_string(), "ignored".to_string());

        let substitution = substitute_variables(&history, &values).unwrap();

        assert_eq!(substitution.replaced, 1);
        assert_eq!(
            substitution.history.records()[0].actions()[0],
            AgentAction::input(0, "joe@example.org")
        );
        assert_eq!(
            history.records()[0].actions()[0],
            AgentAction::input(0, "jane@example.com")
        );
    }

    #[test]
    fn new_values_are_not_substituted_again() {
        let history = HistoryStore::from_records(vec![input_record(&[
            ("Alice", field("first")),
            ("Bob", field("last")),
        ])]);
        let mut values = BTreeMap::new();
        values.insert("first".to_string(), "Bob".to_string());
        values.insert("last".to_string(), "Carol".to_string());

        let substitution = substitute_variables(&history, &values).unwrap();

        assert_eq!(substitution.replaced, 2);
        assert_eq!(
            substitution.history.records()[0].actions(),
            &[AgentAction::input(0, "Bob"), AgentAction::input(1, "Carol")]
        );
    }

    #[test]
    fn swapped_values_land_in_their_own_fields() {
        let history = HistoryStore::from_records(vec![input_record(&[
            ("Alice", field("first")),
            ("Bob", field("last")),
        ])]);
        let mut values = BTreeMap::new();
        values.insert("first".to_string(), "Bob".to_string());
        values.insert("last".to_string(), "Alice".to_string());

        let substitution = substitute_variables(&history, &values).unwrap();

        assert_eq!(
            substitution.history.records()[0].actions(),
            &[AgentAction::input(0, "Bob"), AgentAction::input(1, "Alice")]
        );
    }
}
