//! Implementation of the `scenario-dedup compare` command.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::services::{compare, ComparisonReport};

use super::load_result;

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// First deduplication result
    pub left: PathBuf,

    /// Second deduplication result
    pub right: PathBuf,

    /// Display names for the two results
    #[arg(short, long, value_delimiter = ',', default_values_t = ["left".to_string(), "right".to_string()])]
    pub names: Vec<String>,

    /// Number of differing scenarios to list per side
    #[arg(short, long, default_value = "5")]
    pub sample: usize,
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct CompareOutput(pub ComparisonReport);

impl CommandOutput for CompareOutput {
    fn to_human(&self) -> String {
        let report = &self.0;
        let overlap = &report.overlap;
        let mut lines = vec![TableFormatter::new().format_comparison(report)];

        lines.push(format!(
            "\nCommon scenarios: {} ({:.1}% of {})",
            overlap.common, overlap.overlap_percent, report.left.name
        ));
        lines.push(format!("Only in {}: {}", report.left.name, overlap.only_left));
        lines.push(format!("Only in {}: {}", report.right.name, overlap.only_right));

        for (name, sample) in [
            (&report.left.name, &overlap.sample_only_left),
            (&report.right.name, &overlap.sample_only_right),
        ] {
            if !sample.is_empty() {
                lines.push(format!("\nSample only in {name}:"));
                lines.extend(sample.iter().map(|key| format!("  - {key}")));
            }
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.0).unwrap_or_default()
    }
}

pub async fn execute(args: CompareArgs, json_mode: bool) -> Result<()> {
    let left = load_result(&args.left).await?;
    let right = load_result(&args.right).await?;

    let left_name = args.names.first().map_or("left", String::as_str);
    let right_name = args.names.get(1).map_or("right", String::as_str);

    let report = compare(left_name, &left, right_name, &right, args.sample);
    output(&CompareOutput(report), json_mode);
    Ok(())
}
