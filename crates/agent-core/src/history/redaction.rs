//! Replacement of known secret literals before history leaves the process.

use std::collections::{BTreeMap, HashMap};

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A sensitive value: either a plain literal or literals scoped per domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SensitiveValue {
    Plain(String),
    Scoped(BTreeMap<String, String>),
}

/// Secrets known to the run, in either of the two accepted shapes:
///
/// ```yaml
/// api_key: "abc"              # name -> value
/// "*.example.com":            # domain -> {name -> value}
///   password: "hunter2"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensitiveData(BTreeMap<String, SensitiveValue>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Secret {
    pub name: String,
    pub value: String,
}

impl SensitiveData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), SensitiveValue::Plain(value.into()));
    }

    pub fn insert_scoped(
        &mut self,
        domain: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) {
        let entry = self
            .0
            .entry(domain.into())
            .or_insert_with(|| SensitiveValue::Scoped(BTreeMap::new()));
        match entry {
            SensitiveValue::Scoped(values) => {
                values.insert(name.into(), value.into());
            }
            SensitiveValue::Plain(_) => {
                let mut values = BTreeMap::new();
                values.insert(name.into(), value.into());
                *entry = SensitiveValue::Scoped(values);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.secrets().is_empty()
    }

    /// Flattened secrets, empty values dropped, longest value first.
    pub fn secrets(&self) -> Vec<Secret> {
        let mut secrets: Vec<Secret> = Vec::new();
        for (key, value) in &self.0 {
            match value {
                SensitiveValue::Plain(literal) => secrets.push(Secret {
                    name: key.clone(),
                    value: literal.clone(),
                }),
                SensitiveValue::Scoped(values) => {
                    secrets.extend(values.iter().map(|(name, literal)| Secret {
                        name: name.clone(),
                        value: literal.clone(),
                    }))
                }
            }
        }
        secrets.retain(|secret| !secret.value.is_empty());
        secrets.sort_by(|a, b| {
            b.value
                .len()
                .cmp(&a.value.len())
                .then_with(|| a.name.cmp(&b.name))
        });
        secrets.dedup_by(|a, b| a.value == b.value);
        secrets
    }
}

pub fn placeholder(name: &str) -> String {
    format!("<secret:{name}>")
}

/// Single-pass replacement of secret literals.
///
/// All literals are matched by one alternation, longest first, so text that
/// was already substituted is never scanned again.
#[derive(Debug, Clone)]
pub struct Redactor {
    pattern: Option<Regex>,
    names: HashMap<String, String>,
}

impl Redactor {
    pub fn new(secrets: &[Secret]) -> Result<Self, regex::Error> {
        let mut literals: Vec<&Secret> = secrets.iter().filter(|s| !s.value.is_empty()).collect();
        literals.sort_by(|a, b| b.value.len().cmp(&a.value.len()));

        let pattern = if literals.is_empty() {
            None
        } else {
            let alternation: Vec<String> =
                literals.iter().map(|s| regex::escape(&s.value)).collect();
            Some(Regex::new(&alternation.join("|"))?)
        };
        let mut names = HashMap::new();
        for secret in literals {
            names
                .entry(secret.value.clone())
                .or_insert_with(|| secret.name.clone());
        }
        Ok(Self { pattern, names })
    }

    pub fn is_empty(&self) -> bool {
        self.pattern.is_none()
    }

    pub fn redact_text(&self, text: &str) -> String {
        let Some(pattern) = &self.pattern else {
            return text.to_string();
        };
        pattern
            .replace_all(text, |caps: &Captures<'_>| match self.names.get(&caps[0]) {
                Some(name) => placeholder(name),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Rewrite every string in the document in place. Keys are left untouched.
    /// Returns the number of strings that changed.
    pub fn redact_value(&self, value: &mut Value) -> usize {
        if self.is_empty() {
            return 0;
        }
        match value {
            Value::String(text) => {
                let redacted = self.redact_text(text);
                if redacted != *text {
                    *text = redacted;
                    1
                } else {
                    0
                }
            }
            Value::Array(items) => items.iter_mut().map(|v| self.redact_value(v)).sum(),
            Value::Object(map) => map.values_mut().map(|v| self.redact_value(v)).sum(),
            _ => 0,
        }
    }
}
