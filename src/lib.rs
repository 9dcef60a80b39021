//! Command-line tooling around recorded agent runs: inspection, redaction
//! and variable substitution of saved history documents.

pub mod cli;
pub mod config;

pub use config::{CliConfig, ConfigError};
