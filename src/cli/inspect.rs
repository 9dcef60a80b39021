use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use agent_core::{HistoryStore, StepRecord};
use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use super::context::CliContext;
use super::output::{emit, OutputFormat};

#[derive(Args, Clone, Debug)]
pub struct InspectArgs {
    /// History document to read
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Include one line per step
    #[arg(long)]
    pub steps: bool,
}

#[derive(Debug, Serialize)]
pub struct HistoryReport {
    pub file: PathBuf,
    pub records: usize,
    pub duration_ms: u64,
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub successful: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub judge_verdict: Option<bool>,
    pub action_counts: BTreeMap<&'static str, usize>,
    pub urls: Vec<String>,
    pub errors: Vec<StepError>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<StepLine>,
    /// Secrets from the configuration still present in the document.
    pub unredacted_secrets: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct StepError {
    pub position: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_number: Option<u32>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct StepLine {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_number: Option<u32>,
    pub actions: Vec<&'static str>,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_goal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HistoryReport {
    pub fn build(file: PathBuf, raw: &str, history: &HistoryStore, ctx: &CliContext) -> Self {
        let mut action_counts = BTreeMap::new();
        for name in history.action_names() {
            *action_counts.entry(name).or_insert(0) += 1;
        }

        let mut urls: Vec<String> = Vec::new();
        for url in history.urls().into_iter().flatten() {
            if urls.last().map(String::as_str) != Some(url) {
                urls.push(url.to_string());
            }
        }

        let errors = history
            .iter()
            .enumerate()
            .filter_map(|(position, record)| {
                record.first_error().map(|message| StepError {
                    position,
                    step_number: record.step_number(),
                    message: message.to_string(),
                })
            })
            .collect();

        let unredacted_secrets = ctx
            .config()
            .sensitive_data
            .secrets()
            .into_iter()
            .filter(|secret| raw.contains(&secret.value))
            .map(|secret| secret.name)
            .collect();

        Self {
            file,
            records: history.len(),
            duration_ms: history.total_duration_ms(),
            done: history.is_done(),
            successful: history.is_successful(),
            final_result: history.final_result().map(str::to_string),
            judge_verdict: history.judgement().map(|j| j.verdict),
            action_counts,
            urls,
            errors,
            steps: Vec::new(),
            unredacted_secrets,
        }
    }

    fn with_steps(mut self, history: &HistoryStore) -> Self {
        self.steps = history.iter().map(StepLine::from_record).collect();
        self
    }
}

impl StepLine {
    fn from_record(record: &StepRecord) -> Self {
        Self {
            step_number: record.step_number(),
            actions: record.actions().iter().map(|a| a.name()).collect(),
            url: record.state.url.clone(),
            next_goal: record.next_goal().map(str::to_string),
            error: record.first_error().map(str::to_string),
        }
    }
}

pub async fn cmd_inspect(args: InspectArgs, ctx: &CliContext, output: OutputFormat) -> Result<()> {
    let raw = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read history {}", args.file.display()))?;
    let history = HistoryStore::from_json(&raw)
        .with_context(|| format!("Failed to parse history {}", args.file.display()))?;

    let mut report = HistoryReport::build(args.file, &raw, &history, ctx);
    if args.steps {
        report = report.with_steps(&history);
    }
    emit(&output, &report, render_human)
}

fn render_human(report: &HistoryReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("History: {}\n", report.file.display()));
    out.push_str(&format!(
        "  Records:  {} ({})\n",
        report.records,
        humantime::format_duration(Duration::from_millis(report.duration_ms))
    ));
    let status = match (report.done, report.successful) {
        (true, Some(true)) => "done, successful",
        (true, _) => "done, unsuccessful",
        (false, _) => "not done",
    };
    out.push_str(&format!("  Status:   {status}\n"));
    if let Some(verdict) = report.judge_verdict {
        out.push_str(&format!(
            "  Judge:    {}\n",
            if verdict { "pass" } else { "fail" }
        ));
    }
    if let Some(result) = &report.final_result {
        out.push_str(&format!("  Result:   {result}\n"));
    }
    if !report.action_counts.is_empty() {
        let counts: Vec<String> = report
            .action_counts
            .iter()
            .map(|(name, count)| format!("{name}={count}"))
            .collect();
        out.push_str(&format!("  Actions:  {}\n", counts.join(", ")));
    }
    for url in &report.urls {
        out.push_str(&format!("  Visited:  {url}\n"));
    }
    for error in &report.errors {
        let label = error
            .step_number
            .map(|n| format!("step {n}"))
            .unwrap_or_else(|| format!("record {}", error.position));
        out.push_str(&format!("  Error:    [{label}] {}\n", error.message));
    }
    for step in &report.steps {
        let number = step
            .step_number
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "  {number:>4}  {:<28} {}\n",
            step.actions.join(","),
            step.error.as_deref().or(step.next_goal.as_deref()).unwrap_or("")
        ));
    }
    if !report.unredacted_secrets.is_empty() {
        out.push_str(&format!(
            "  Warning:  unredacted secrets present: {}\n",
            report.unredacted_secrets.join(", ")
        ));
    }
    out
}
