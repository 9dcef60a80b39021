//! Core types for the match cascade

use std::fmt;

use serde::{Deserialize, Serialize};

/// One level of the match cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchLevel {
    /// Full element hash equality
    Exact,
    /// Hash over node name, accessible name and non-volatile attributes
    Stable,
    /// Literal XPath equality
    Xpath,
    /// Same node kind and a unique identifying attribute
    Attribute,
}

impl MatchLevel {
    pub fn name(&self) -> &'static str {
        match self {
            MatchLevel::Exact => "EXACT",
            MatchLevel::Stable => "STABLE",
            MatchLevel::Xpath => "XPATH",
            MatchLevel::Attribute => "ATTRIBUTE",
        }
    }

    /// All levels, in the order they are tried.
    pub fn cascade() -> [MatchLevel; 4] {
        [
            MatchLevel::Exact,
            MatchLevel::Stable,
            MatchLevel::Xpath,
            MatchLevel::Attribute,
        ]
    }

    /// Levels that say two identities are the same element outright.
    pub fn identity_levels() -> [MatchLevel; 3] {
        [MatchLevel::Exact, MatchLevel::Stable, MatchLevel::Xpath]
    }
}

impl fmt::Display for MatchLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a recorded element was found in the current index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub index: u32,
    pub level: MatchLevel,
    /// The identifying attribute that matched, for ATTRIBUTE matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl MatchOutcome {
    pub fn new(index: u32, level: MatchLevel) -> Self {
        Self {
            index,
            level,
            attribute: None,
        }
    }
}
