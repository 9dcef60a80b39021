use anyhow::Result;
use serde::Serialize;

use super::context::CliContext;
use super::output::{emit, OutputFormat};
use crate::config::CliConfig;

#[derive(Serialize)]
struct BuildInfo<'a> {
    version: &'static str,
    build_date: &'static str,
    git_hash: &'static str,
    config_path: String,
    env_overrides: &'a [String],
    config: &'a CliConfig,
}

pub async fn cmd_info(ctx: &CliContext, output: OutputFormat) -> Result<()> {
    let info = BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        build_date: env!("BUILD_DATE"),
        git_hash: env!("GIT_HASH"),
        config_path: ctx.config_path().display().to_string(),
        env_overrides: ctx.overrides(),
        config: ctx.config(),
    };

    emit(&output, &info, |info| {
        let mut out = String::from("steptrail\n");
        out.push_str(&format!("  Version:    {}\n", info.version));
        out.push_str(&format!("  Built:      {} ({})\n", info.build_date, info.git_hash));
        out.push_str(&format!("  Config:     {}\n", info.config_path));
        if !info.env_overrides.is_empty() {
            out.push_str(&format!("  Overrides:  {}\n", info.env_overrides.join(", ")));
        }
        let agent = &info.config.agent;
        out.push_str(&format!(
            "  Agent:      max_steps={} max_actions_per_step={} max_failures={} judge={}\n",
            agent.max_steps, agent.max_actions_per_step, agent.max_failures, agent.use_judge
        ));
        let replay = &info.config.replay;
        out.push_str(&format!(
            "  Replay:     max_retries={} skip_failures={} delay_ms={}\n",
            replay.max_retries, replay.skip_failures, replay.delay_between_actions_ms
        ));
        out.push_str(&format!(
            "  Secrets:    {}\n",
            info.config.sensitive_data.secrets().len()
        ));
        out
    })
}
