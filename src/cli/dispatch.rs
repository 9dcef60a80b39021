use super::env::CliArgs;
use super::info::cmd_info;
use super::inspect::cmd_inspect;
use super::redact::cmd_redact;
use super::variables::{cmd_substitute, cmd_variables};
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;
use anyhow::Result;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Inspect(args) => cmd_inspect(args, ctx, cli.output.clone()).await,
        Commands::Redact(args) => cmd_redact(args, ctx).await,
        Commands::Variables(args) => cmd_variables(args, cli.output.clone()).await,
        Commands::Substitute(args) => cmd_substitute(args).await,
        Commands::Info => cmd_info(ctx, cli.output.clone()).await,
    }
}
