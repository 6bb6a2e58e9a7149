//! Implementation of the `scenario-dedup dedup` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::adapters::build_services;
use crate::adapters::sinks::JsonFileSink;
use crate::cli::output::progress::{create_spinner, visible_or_hidden, ProgressBarExt};
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::{
    AuditEntry, BatchFlag, Config, DuplicatePair, ScenarioRecord, StrategyKind,
};
use crate::domain::ports::ResultSink;
use crate::services::DedupEngine;

use super::load_scenarios;

#[derive(Args, Debug)]
pub struct DedupArgs {
    /// Scenario collection to deduplicate (JSON)
    pub input: PathBuf,

    /// Where to write the deduplicated `{features, removed}` document
    #[arg(short, long, default_value = "deduplicated.json")]
    pub output: PathBuf,

    /// Reduction strategy: threshold, nli or llm (defaults to the configured one)
    #[arg(short, long)]
    pub strategy: Option<StrategyKind>,

    /// Also write the full run report (counts, flags, pair audit) here
    #[arg(short, long)]
    pub report: Option<PathBuf>,

    /// Number of top duplicate pairs to show
    #[arg(short, long, default_value = "10")]
    pub top: usize,

    /// Print the pair audit table
    #[arg(long)]
    pub audit: bool,
}

#[derive(Debug, Serialize)]
pub struct DedupCommandOutput {
    pub strategy: String,
    pub input: usize,
    pub kept: usize,
    pub removed: usize,
    pub removal_rate: f64,
    pub degraded_pairs: usize,
    pub flagged_batches: Vec<BatchFlag>,
    pub malformed: Vec<usize>,
    pub top_duplicates: Vec<DuplicatePair>,
    pub notices: Vec<String>,
    pub output_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_path: Option<PathBuf>,
    #[serde(skip)]
    records: Vec<ScenarioRecord>,
    #[serde(skip)]
    audit: Option<Vec<AuditEntry>>,
}

impl CommandOutput for DedupCommandOutput {
    fn to_human(&self) -> String {
        let formatter = TableFormatter::new();
        let mut lines = vec![format!(
            "Strategy {}: kept {} of {} scenarios, removed {} ({:.1}%)",
            self.strategy, self.kept, self.input, self.removed, self.removal_rate
        )];

        if !self.top_duplicates.is_empty() {
            lines.push(format!("\nTop {} duplicate pairs:", self.top_duplicates.len()));
            lines.push(formatter.format_duplicates(&self.top_duplicates, &self.records));
        }

        if !self.flagged_batches.is_empty() {
            lines.push("\nBatches kept unprocessed:".to_string());
            lines.push(formatter.format_flags(&self.flagged_batches));
        }

        if let Some(audit) = self.audit.as_deref().filter(|a| !a.is_empty()) {
            lines.push(format!("\nPair audit ({} rows):", audit.len()));
            lines.push(formatter.format_audit(audit));
        }

        if !self.notices.is_empty() {
            lines.push("\nNotices:".to_string());
            for notice in &self.notices {
                lines.push(format!("  - {notice}"));
            }
        }

        lines.push(format!("\nDeduplicated scenarios written to {}", self.output_path.display()));
        if let Some(report) = &self.report_path {
            lines.push(format!("Run report written to {}", report.display()));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: DedupArgs, config: &Config, json_mode: bool) -> Result<()> {
    let scenarios = load_scenarios(&args.input).await?;
    let services = build_services(config).context("Failed to construct external services")?;
    let engine = DedupEngine::new(config.clone(), services);
    let strategy = args.strategy.unwrap_or(config.strategy);

    let spinner = visible_or_hidden(
        create_spinner(format!(
            "Deduplicating {} scenarios with {strategy}",
            scenarios.len()
        )),
        json_mode,
    );
    let outcome = match engine.run(Some(strategy), &scenarios.features).await {
        Ok(outcome) => outcome,
        Err(err) => {
            spinner.finish_warning("Deduplication failed");
            return Err(err).context("Deduplication run failed");
        }
    };
    spinner.finish_success(format!("Removed {} scenarios", outcome.report.removed_count));

    let mut sink = JsonFileSink::new(&args.output);
    if let Some(report) = &args.report {
        sink = sink.with_report(report);
    }
    sink.write(&outcome)
        .await
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    let report = outcome.report;
    let result = DedupCommandOutput {
        strategy: report.strategy.clone(),
        input: report.input_count,
        kept: report.kept_count,
        removed: report.removed_count,
        removal_rate: report.removal_rate(),
        degraded_pairs: report.degraded_pairs,
        top_duplicates: report.top_duplicates(args.top),
        flagged_batches: report.flagged_batches,
        malformed: report.malformed,
        notices: report.notices,
        output_path: args.output,
        report_path: args.report,
        records: scenarios.features,
        audit: args.audit.then_some(report.audit),
    };
    output(&result, json_mode);
    Ok(())
}
