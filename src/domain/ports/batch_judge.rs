//! Batch judgment port for the generative reduction strategy.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::models::ScenarioRecord;

/// Why a judgment call produced nothing usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Connection, HTTP status or protocol failure.
    Transport,
    /// The call did not finish in time.
    Timeout,
    /// The service answered with no content.
    EmptyResponse,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport => write!(f, "transport failure"),
            Self::Timeout => write!(f, "timeout"),
            Self::EmptyResponse => write!(f, "empty response"),
        }
    }
}

/// What a judgment service handed back.
///
/// Services with structured output return `Parsed`; plain-text services
/// return `RawText`, which the judgment parser turns into the target shape.
#[derive(Debug, Clone, PartialEq)]
pub enum JudgmentResponse {
    Parsed(Value),
    RawText(String),
    Failure { kind: FailureKind, message: String },
}

impl JudgmentResponse {
    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            message: message.into(),
        }
    }
}

/// A scenario as sent to a judge, tagged with its position in the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItem {
    pub id: usize,
    #[serde(flatten)]
    pub record: ScenarioRecord,
}

/// Jointly classifies a batch of scenarios as keep or remove.
#[async_trait]
pub trait BatchJudge: Send + Sync {
    fn name(&self) -> &'static str;

    /// Judge one batch. Never errors: failures come back as
    /// [`JudgmentResponse::Failure`].
    async fn judge_batch(&self, batch: &[BatchItem]) -> JudgmentResponse;
}
