//! CLI configuration
//!
//! Loaded from YAML, then individual keys may be overridden through
//! `STEPTRAIL_*` environment variables.

use std::env;
use std::fmt::Display;
use std::str::FromStr;

use action_replay::ReplayConfig;
use agent_core::{AgentLoopConfig, SensitiveData};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_PREFIX: &str = "STEPTRAIL_";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidOverride {
        key: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub agent: AgentLoopConfig,
    pub replay: ReplayConfig,
    /// Secrets replaced by placeholders when histories are written.
    pub sensitive_data: SensitiveData,
}

impl CliConfig {
    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<Vec<String>, ConfigError> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from `lookup`, returning the keys that were set.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Vec<String>, ConfigError> {
        let mut applied = Vec::new();
        let mut take = |name: &str| {
            let key = format!("{ENV_PREFIX}{name}");
            let value = lookup(&key)?;
            applied.push(key.clone());
            Some((key, value))
        };

        if let Some((key, raw)) = take("MAX_STEPS") {
            self.agent.max_steps = parse_number(&key, &raw)?;
        }
        if let Some((key, raw)) = take("MAX_ACTIONS_PER_STEP") {
            self.agent.max_actions_per_step = parse_number(&key, &raw)?;
        }
        if let Some((key, raw)) = take("MAX_FAILURES") {
            self.agent.max_failures = parse_number(&key, &raw)?;
        }
        if let Some((key, raw)) = take("LLM_TIMEOUT_MS") {
            self.agent.llm_timeout_ms = parse_number(&key, &raw)?;
        }
        if let Some((key, raw)) = take("STEP_TIMEOUT_MS") {
            self.agent.step_timeout_ms = parse_number(&key, &raw)?;
        }
        if let Some((key, raw)) = take("USE_JUDGE") {
            self.agent.use_judge = parse_flag(&key, &raw)?;
        }
        if let Some((key, raw)) = take("REPLAY_MAX_RETRIES") {
            self.replay.max_retries = parse_number(&key, &raw)?;
        }
        if let Some((key, raw)) = take("REPLAY_SKIP_FAILURES") {
            self.replay.skip_failures = parse_flag(&key, &raw)?;
        }
        if let Some((key, raw)) = take("REPLAY_DELAY_MS") {
            self.replay.delay_between_actions_ms = parse_number(&key, &raw)?;
        }
        Ok(applied)
    }
}

fn parse_number<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim().parse().map_err(|err: T::Err| ConfigError::InvalidOverride {
        key: key.to_string(),
        value: raw.to_string(),
        reason: err.to_string(),
    })
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidOverride {
            key: key.to_string(),
            value: raw.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}
