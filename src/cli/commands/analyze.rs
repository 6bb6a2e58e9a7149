//! Implementation of the `scenario-dedup analyze` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::adapters::build_services;
use crate::cli::output::progress::{create_progress_bar, visible_or_hidden, ProgressBarExt};
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::{AuditEntry, Config};
use crate::services::{AnalysisSummary, DedupEngine, StepAnalyzer};

use super::load_scenarios;

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Scenario collection to analyze (JSON)
    pub input: PathBuf,

    /// Write the pair audit as JSON to this file
    #[arg(short, long)]
    pub audit: Option<PathBuf>,

    /// Maximum audit rows to print (0 prints none)
    #[arg(short, long, default_value = "20")]
    pub limit: usize,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeOutput {
    pub summary: AnalysisSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_path: Option<PathBuf>,
    pub audit: Vec<AuditEntry>,
    #[serde(skip)]
    limit: usize,
}

impl CommandOutput for AnalyzeOutput {
    fn to_human(&self) -> String {
        let formatter = TableFormatter::new();
        let s = &self.summary;
        let mut lines = vec![formatter.format_counts(&[
            ("scenarios", s.scenarios),
            ("steps", s.steps),
            ("pairs", s.pairs),
            ("classified", s.classified),
            ("degraded", s.degraded),
            ("duplicate", s.duplicate),
            ("contradictory", s.contradictory),
            ("ambiguous", s.ambiguous),
            ("distinct", s.distinct),
        ])];

        // Most similar pairs first; everything else is in the audit file.
        let mut rows: Vec<AuditEntry> = self.audit.clone();
        rows.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        rows.truncate(self.limit);
        if !rows.is_empty() {
            lines.push(format!("\nTop {} pairs by similarity:", rows.len()));
            lines.push(formatter.format_audit(&rows));
        }

        if let Some(path) = &self.audit_path {
            lines.push(format!("\nAudit written to {}", path.display()));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: AnalyzeArgs, config: &Config, json_mode: bool) -> Result<()> {
    let scenarios = load_scenarios(&args.input).await?;
    let services = build_services(config).context("Failed to construct external services")?;
    let engine = DedupEngine::new(config.clone(), services);
    let analyzer = engine.analyzer();

    let total = StepAnalyzer::pair_count(&scenarios.features);
    let pb = visible_or_hidden(create_progress_bar(total as u64), json_mode);
    pb.set_message("step pairs");

    let analysis = analyzer
        .analyze(engine.embedder(), &scenarios.features, || pb.inc(1))
        .await;
    let analysis = match analysis {
        Ok(analysis) => analysis,
        Err(err) => {
            pb.finish_warning("Analysis failed");
            return Err(err).context("Step analysis failed");
        }
    };
    pb.finish_success(format!("Compared {} step pairs", analysis.summary.pairs));

    let audit = analysis.audit();
    if let Some(path) = &args.audit {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let body = serde_json::to_string_pretty(&audit).context("Failed to serialize audit")?;
        tokio::fs::write(path, body)
            .await
            .with_context(|| format!("Failed to write audit to {}", path.display()))?;
    }

    let result = AnalyzeOutput {
        summary: analysis.summary,
        audit_path: args.audit,
        audit,
        limit: args.limit,
    };
    output(&result, json_mode);
    Ok(())
}
