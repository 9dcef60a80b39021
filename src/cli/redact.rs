use std::path::PathBuf;

use agent_core::HistoryStore;
use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::info;

use super::context::CliContext;
use super::variables::parse_assignment;

#[derive(Args, Clone, Debug)]
pub struct RedactArgs {
    /// History document to read
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Where to write the redacted copy
    #[arg(long, value_name = "FILE")]
    pub out: PathBuf,

    /// Additional secret as NAME=VALUE (repeatable)
    #[arg(long = "secret", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    pub secrets: Vec<(String, String)>,
}

pub async fn cmd_redact(args: RedactArgs, ctx: &CliContext) -> Result<()> {
    let mut sensitive = ctx.config().sensitive_data.clone();
    for (name, value) in args.secrets {
        sensitive.insert(name, value);
    }
    if sensitive.is_empty() {
        bail!("No secrets configured; pass --secret NAME=VALUE or set sensitive_data in the config");
    }

    let history = HistoryStore::load_from_file(&args.file)
        .with_context(|| format!("Failed to load history {}", args.file.display()))?;
    history
        .save_to_file(&args.out, Some(&sensitive))
        .with_context(|| format!("Failed to write {}", args.out.display()))?;

    info!(
        records = history.len(),
        secrets = sensitive.secrets().len(),
        out = %args.out.display(),
        "wrote redacted history"
    );
    println!("Redacted history written to {}", args.out.display());
    Ok(())
}
