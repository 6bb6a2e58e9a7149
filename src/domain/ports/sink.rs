use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::DedupOutcome;

/// Accepts the final scenario set and its audit log.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn write(&self, outcome: &DedupOutcome) -> DomainResult<()>;
}
