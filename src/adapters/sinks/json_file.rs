//! JSON file sink.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;

use crate::domain::errors::DomainResult;
use crate::domain::models::DedupOutcome;
use crate::domain::ports::ResultSink;

/// Writes `{features, removed}` to `output` and, when set, the full run
/// report (counts, flags and the pair audit) to `report`.
pub struct JsonFileSink {
    output: PathBuf,
    report: Option<PathBuf>,
}

impl JsonFileSink {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            report: None,
        }
    }

    pub fn with_report(mut self, report: impl Into<PathBuf>) -> Self {
        self.report = Some(report.into());
        self
    }
}

async fn write_json<T: serde::Serialize>(path: &PathBuf, value: &T) -> DomainResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let body = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, body).await?;
    Ok(())
}

#[async_trait]
impl ResultSink for JsonFileSink {
    async fn write(&self, outcome: &DedupOutcome) -> DomainResult<()> {
        write_json(&self.output, &outcome.result.to_output()).await?;
        info!(path = %self.output.display(), "Deduplicated scenarios written");

        if let Some(report) = &self.report {
            write_json(report, &outcome.report).await?;
            info!(path = %report.display(), "Run report written");
        }
        Ok(())
    }
}
