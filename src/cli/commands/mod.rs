//! CLI command implementations.

pub mod analyze;
pub mod compare;
pub mod config;
pub mod dedup;

use std::path::Path;

use anyhow::{Context, Result};

use crate::domain::models::{DedupOutput, ScenarioSet};

/// Read a scenario collection from a JSON file.
pub async fn load_scenarios(path: &Path) -> Result<ScenarioSet> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read scenarios from {}", path.display()))?;
    ScenarioSet::from_json_str(&raw)
        .with_context(|| format!("Failed to parse scenarios in {}", path.display()))
}

/// Read a `{features, removed}` result document written by `dedup`.
pub async fn load_result(path: &Path) -> Result<DedupOutput> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read result from {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a deduplication result", path.display()))
}
