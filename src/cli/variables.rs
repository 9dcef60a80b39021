use std::collections::BTreeMap;
use std::path::PathBuf;

use agent_core::{detect_variables, substitute_variables, DetectedVariable, HistoryStore};
use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use super::output::{emit, OutputFormat};

#[derive(Args, Clone, Debug)]
pub struct VariablesArgs {
    /// History document to read
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

#[derive(Args, Clone, Debug)]
pub struct SubstituteArgs {
    /// History document to read
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// New value for a detected variable as NAME=VALUE (repeatable)
    #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment, required = true)]
    pub values: Vec<(String, String)>,

    /// Where to write the rewritten copy
    #[arg(long, value_name = "FILE")]
    pub out: PathBuf,
}

/// Parse a `NAME=VALUE` argument. The value may itself contain `=`.
pub fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got {raw:?}")),
    }
}

pub async fn cmd_variables(args: VariablesArgs, output: OutputFormat) -> Result<()> {
    let history = HistoryStore::load_from_file(&args.file)
        .with_context(|| format!("Failed to load history {}", args.file.display()))?;
    let detected = detect_variables(&history);
    emit(&output, &detected, render_human)
}

fn render_human(detected: &BTreeMap<String, DetectedVariable>) -> String {
    if detected.is_empty() {
        return "No variables detected".to_string();
    }
    let mut out = String::new();
    for (name, variable) in detected {
        let kind = serde_json::to_value(variable.var_type)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        out.push_str(&format!("{name:<16} {kind:<7} {:?}", variable.original_value));
        if let Some(format) = &variable.format {
            out.push_str(&format!(" ({format})"));
        }
        out.push('\n');
    }
    out
}

pub async fn cmd_substitute(args: SubstituteArgs) -> Result<()> {
    let history = HistoryStore::load_from_file(&args.file)
        .with_context(|| format!("Failed to load history {}", args.file.display()))?;
    let values: BTreeMap<String, String> = args.values.into_iter().collect();

    let substitution = substitute_variables(&history, &values)?;
    substitution
        .history
        .save_to_file(&args.out, None)
        .with_context(|| format!("Failed to write {}", args.out.display()))?;

    info!(replaced = substitution.replaced, out = %args.out.display(), "wrote substituted history");
    println!(
        "Replaced {} value(s); history written to {}",
        substitution.replaced,
        args.out.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_keeps_equals_in_value() {
        assert_eq!(
            parse_assignment("token=a=b").unwrap(),
            ("token".to_string(), "a=b".to_string())
        );
    }

    #[test]
    fn assignment_requires_a_name() {
        assert!(parse_assignment("=value").is_err());
        assert!(parse_assignment("novalue").is_err());
    }
}
