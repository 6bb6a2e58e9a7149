//! Relation judgment port (natural language inference).

use async_trait::async_trait;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::RelationLabel;

/// Raw answer from a relation judgment service.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelationJudgment {
    pub label: RelationLabel,
    pub confidence: f64,
}

/// Classifies a premise/hypothesis pair joined into one text.
#[async_trait]
pub trait RelationJudge: Send + Sync {
    fn name(&self) -> &'static str;

    /// Classify `pair_text`. Fails with [`DomainError::RelationService`] on
    /// transport problems or a malformed/empty answer.
    async fn classify(&self, pair_text: &str) -> DomainResult<RelationJudgment>;
}

/// A judge for strategies that never classify. Every call fails, so any
/// accidental use degrades to NEUTRAL instead of producing a verdict.
#[derive(Debug, Clone, Default)]
pub struct NullRelationJudge;

impl NullRelationJudge {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RelationJudge for NullRelationJudge {
    fn name(&self) -> &'static str {
        "null"
    }

    async fn classify(&self, _pair_text: &str) -> DomainResult<RelationJudgment> {
        Err(DomainError::RelationService(
            "no relation judge configured".to_string(),
        ))
    }
}
