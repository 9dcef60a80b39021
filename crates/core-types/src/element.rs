use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

/// Attributes that identify a control across page loads, in matching priority order.
pub const IDENTIFYING_ATTRIBUTES: [&str; 3] = ["name", "id", "aria-label"];

/// Attributes whose values track interaction state rather than identity.
const VOLATILE_ATTRIBUTES: &[&str] = &[
    "style",
    "value",
    "checked",
    "selected",
    "aria-busy",
    "aria-checked",
    "aria-expanded",
    "aria-pressed",
    "aria-selected",
    "data-state",
];

const DYNAMIC_CLASSES: &[&str] = &[
    "active", "focus", "focused", "hover", "hovered", "pressed", "visited", "open", "opened",
    "loading", "loaded", "selected", "expanded", "collapsed", "show", "showing",
];

const DYNAMIC_CLASS_PREFIXES: &[&str] = &["animate", "animated", "transition", "fade", "is-"];

/// Durable description of a DOM target, captured when the agent interacted with it.
///
/// `element_hash` covers the node name, XPath, every attribute and the
/// accessible name. `stable_hash` covers only the node name, the accessible
/// name and the attributes that do not change with hover/focus/animation
/// state, so a re-rendered control keeps the same stable hash.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ElementIdentity {
    pub node_name: String,
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub attributes: BTreeMap<String, String>,
    #[cfg_attr(
        feature = "serde-full",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub ax_name: Option<String>,
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub xpath: String,
    pub element_hash: u64,
    /// Missing on identities recorded before stable hashing existed.
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub stable_hash: Option<u64>,
}

impl ElementIdentity {
    /// Build an identity and compute both hashes from its parts.
    pub fn new<I, K, V>(node_name: impl Into<String>, xpath: impl Into<String>, attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut identity = Self {
            node_name: node_name.into(),
            attributes: attributes
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            ax_name: None,
            xpath: xpath.into(),
            element_hash: 0,
            stable_hash: None,
        };
        identity.rehash();
        identity
    }

    pub fn with_ax_name(mut self, name: impl Into<String>) -> Self {
        self.ax_name = Some(name.into());
        self.rehash();
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self.rehash();
        self
    }

    fn rehash(&mut self) {
        self.element_hash = self.compute_element_hash();
        self.stable_hash = Some(self.compute_stable_hash());
    }

    /// Non-empty attribute value.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Node name in lower case, as compared by the matcher.
    pub fn node_kind(&self) -> String {
        self.node_name.to_ascii_lowercase()
    }

    pub fn compute_element_hash(&self) -> u64 {
        let mut parts = vec![self.node_kind(), self.xpath.clone()];
        for (key, value) in &self.attributes {
            parts.push(format!("{key}={value}"));
        }
        parts.push(self.ax_name.clone().unwrap_or_default());
        digest(&parts)
    }

    /// Hash over the time-invariant attributes only, recomputed from the
    /// current attribute state.
    pub fn compute_stable_hash(&self) -> u64 {
        let mut parts = vec![self.node_kind()];
        for (key, value) in &self.attributes {
            if VOLATILE_ATTRIBUTES.contains(&key.as_str()) {
                continue;
            }
            if key == "class" {
                parts.push(format!("class={}", static_classes(value)));
            } else {
                parts.push(format!("{key}={value}"));
            }
        }
        parts.push(self.ax_name.clone().unwrap_or_default());
        digest(&parts)
    }

    /// One-line description used in replay diagnostics.
    pub fn describe(&self) -> String {
        let mut parts = vec![format!("<{}>", self.node_name)];
        for key in IDENTIFYING_ATTRIBUTES.iter().copied().chain(["type"]) {
            if let Some(value) = self.attribute(key) {
                parts.push(format!("{key}=\"{value}\""));
            }
        }
        parts.push(format!("hash={}", hex::encode(self.element_hash.to_be_bytes())));
        if let Some(stable) = self.stable_hash {
            parts.push(format!("stable_hash={}", hex::encode(stable.to_be_bytes())));
        }
        if !self.xpath.is_empty() {
            let count = self.xpath.chars().count();
            let xpath = if count <= 60 {
                self.xpath.clone()
            } else {
                let tail: String = self.xpath.chars().skip(count - 57).collect();
                format!("...{tail}")
            };
            parts.push(format!("xpath=\"{xpath}\""));
        }
        parts.join(" ")
    }
}

fn static_classes(value: &str) -> String {
    let mut tokens: Vec<&str> = value
        .split_whitespace()
        .filter(|token| {
            let lower = token.to_ascii_lowercase();
            !DYNAMIC_CLASSES.contains(&lower.as_str())
                && !DYNAMIC_CLASS_PREFIXES
                    .iter()
                    .any(|prefix| lower.starts_with(prefix))
        })
        .collect();
    tokens.sort_unstable();
    tokens.dedup();
    tokens.join(" ")
}

fn digest(parts: &[String]) -> u64 {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0x1f]);
    }
    let out = hasher.finalize();
    let mut head = [0u8; 8];
    head.copy_from_slice(&out[..8]);
    u64::from_be_bytes(head)
}
