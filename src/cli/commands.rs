use clap::Subcommand;

use super::inspect::InspectArgs;
use super::redact::RedactArgs;
use super::variables::{SubstituteArgs, VariablesArgs};

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Summarize a saved run history
    Inspect(InspectArgs),

    /// Write a copy of a history with secret literals replaced
    Redact(RedactArgs),

    /// List the input values a rerun could change
    Variables(VariablesArgs),

    /// Write a copy of a history with new values for detected variables
    Substitute(SubstituteArgs),

    /// Show build information and the effective configuration
    Info,
}
