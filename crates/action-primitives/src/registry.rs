//! Declarative action vocabulary.
//!
//! Every action kind is registered once with an availability predicate.
//! The vocabulary offered to the oracle for a given page is a filtered
//! view over the registry, computed from the snapshot.

use tracing::debug;
use url::Url;

use crate::errors::ActionError;
use crate::primitives::BrowserSnapshot;
use crate::types::{ActionKind, AgentAction};

/// When an action kind may be offered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Always,
    /// Only on pages whose host matches one of the domains.
    /// `*.example.com` matches sub-domains and the bare domain.
    Domains(Vec<String>),
    /// Only when more than this many tabs are open.
    MoreTabsThan(usize),
}

impl Availability {
    pub fn is_available(&self, snapshot: &BrowserSnapshot) -> bool {
        match self {
            Availability::Always => true,
            Availability::Domains(domains) => {
                let Some(host) = Url::parse(&snapshot.url)
                    .ok()
                    .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
                else {
                    return false;
                };
                domains.iter().any(|pattern| domain_matches(&host, pattern))
            }
            Availability::MoreTabsThan(count) => snapshot.tabs.len() > *count,
        }
    }
}

fn domain_matches(host: &str, pattern: &str) -> bool {
    let pattern = pattern.trim().to_ascii_lowercase();
    let bare = pattern.strip_prefix("*.").unwrap_or(&pattern);
    host == bare || host.ends_with(&format!(".{bare}"))
}

#[derive(Debug, Clone)]
pub struct ActionSpec {
    pub kind: ActionKind,
    pub description: String,
    pub availability: Availability,
}

impl ActionSpec {
    pub fn new(kind: ActionKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            availability: Availability::Always,
        }
    }

    pub fn available(mut self, availability: Availability) -> Self {
        self.availability = availability;
        self
    }
}

#[derive(Debug, Clone)]
pub struct ActionRegistry {
    specs: Vec<ActionSpec>,
}

impl Default for ActionRegistry {
    fn default() -> Self {
        let specs = vec![
            ActionSpec::new(ActionKind::Navigate, "Navigate to a URL"),
            ActionSpec::new(ActionKind::GoBack, "Go back in history"),
            ActionSpec::new(ActionKind::Click, "Click the element at an index"),
            ActionSpec::new(ActionKind::Input, "Type text into the element at an index"),
            ActionSpec::new(ActionKind::SelectOption, "Select a dropdown option"),
            ActionSpec::new(ActionKind::Scroll, "Scroll the page or an element"),
            ActionSpec::new(ActionKind::SendKeys, "Send keyboard keys"),
            ActionSpec::new(ActionKind::SwitchTab, "Switch to another tab")
                .available(Availability::MoreTabsThan(1)),
            ActionSpec::new(ActionKind::CloseTab, "Close a tab")
                .available(Availability::MoreTabsThan(1)),
            ActionSpec::new(ActionKind::Extract, "Extract information from the page"),
            ActionSpec::new(ActionKind::Wait, "Wait a number of seconds"),
            ActionSpec::new(ActionKind::UploadFile, "Upload a file to a file input"),
            ActionSpec::new(ActionKind::Done, "Finish the task"),
        ];
        Self { specs }
    }
}

impl ActionRegistry {
    pub fn empty() -> Self {
        Self { specs: Vec::new() }
    }

    /// Register a kind, replacing any previous registration of it.
    pub fn register(&mut self, spec: ActionSpec) {
        if let Some(existing) = self.specs.iter_mut().find(|s| s.kind == spec.kind) {
            *existing = spec;
        } else {
            self.specs.push(spec);
        }
    }

    pub fn spec(&self, kind: ActionKind) -> Option<&ActionSpec> {
        self.specs.iter().find(|spec| spec.kind == kind)
    }

    pub fn contains(&self, kind: ActionKind) -> bool {
        self.spec(kind).is_some()
    }

    /// Kinds offered on the page described by `snapshot`.
    pub fn vocabulary_for(&self, snapshot: &BrowserSnapshot) -> Vec<ActionKind> {
        let kinds: Vec<ActionKind> = self
            .specs
            .iter()
            .filter(|spec| spec.availability.is_available(snapshot))
            .map(|spec| spec.kind)
            .collect();
        debug!(url = %snapshot.url, count = kinds.len(), "computed action vocabulary");
        kinds
    }

    /// Check an action against an already computed vocabulary.
    pub fn check(action: &AgentAction, vocabulary: &[ActionKind]) -> Result<(), ActionError> {
        if vocabulary.contains(&action.kind()) {
            Ok(())
        } else {
            Err(ActionError::NotAvailable(format!(
                "'{}' is not in the current action vocabulary",
                action.name()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use steptrail_core_types::TabInfo;

    #[test]
    fn tab_actions_need_several_tabs() {
        let registry = ActionRegistry::default();
        let mut snapshot = BrowserSnapshot::new("https://example.com", "Example");
        snapshot.tabs.push(TabInfo::new("t1", "https://example.com", "Example"));

        let single = registry.vocabulary_for(&snapshot);
        assert!(!single.contains(&ActionKind::SwitchTab));
        assert!(single.contains(&ActionKind::Click));

        snapshot.tabs.push(TabInfo::new("t2", "https://other.test", "Other"));
        assert!(registry
            .vocabulary_for(&snapshot)
            .contains(&ActionKind::SwitchTab));
    }

    #[test]
    fn domain_availability_matches_subdomains() {
        let rule = Availability::Domains(vec!["*.example.com".into()]);
        assert!(rule.is_available(&BrowserSnapshot::new("https://shop.example.com/a", "")));
        assert!(rule.is_available(&BrowserSnapshot::new("https://example.com", "")));
        assert!(!rule.is_available(&BrowserSnapshot::new("https://notexample.com", "")));
        assert!(!rule.is_available(&BrowserSnapshot::new("about:blank", "")));
    }

    #[test]
    fn register_replaces_existing_kind() {
        let mut registry = ActionRegistry::default();
        registry.register(
            ActionSpec::new(ActionKind::Extract, "Extract")
                .available(Availability::Domains(vec!["docs.rs".into()])),
        );
        let vocab = registry.vocabulary_for(&BrowserSnapshot::new("https://crates.io", ""));
        assert!(!vocab.contains(&ActionKind::Extract));
        assert_eq!(registry.vocabulary_for(&BrowserSnapshot::new("https://docs.rs", "")).len(), 11);
    }

    #[test]
    fn check_rejects_kinds_outside_vocabulary() {
        let vocab = vec![ActionKind::Done];
        assert!(ActionRegistry::check(&AgentAction::done(true, "ok"), &vocab).is_ok());
        assert!(ActionRegistry::check(&AgentAction::click(1), &vocab).is_err());
    }
}
