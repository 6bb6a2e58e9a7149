//! Gated pairwise relation classification.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::RelationVerdict;
use crate::domain::ports::RelationJudge;

/// Default separator between the two texts of a pair.
pub const DEFAULT_SEPARATOR: &str = " </s> ";

/// Wraps a [`RelationJudge`] with the similarity gate, a per-call timeout
/// and the NEUTRAL fallback.
#[derive(Clone)]
pub struct RelationClassifier {
    judge: Arc<dyn RelationJudge>,
    gate: f64,
    separator: String,
    timeout: Duration,
}

impl RelationClassifier {
    pub fn new(judge: Arc<dyn RelationJudge>, gate: f64, timeout: Duration) -> Self {
        Self {
            judge,
            gate,
            separator: DEFAULT_SEPARATOR.to_string(),
            timeout,
        }
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn gate(&self) -> f64 {
        self.gate
    }

    /// The single text sent to the judgment service.
    pub fn pair_text(&self, text_a: &str, text_b: &str) -> String {
        format!("{text_a}{}{text_b}", self.separator)
    }

    /// Classify unconditionally.
    pub async fn classify(&self, text_a: &str, text_b: &str) -> DomainResult<RelationVerdict> {
        let input = self.pair_text(text_a, text_b);
        let judgment = tokio::time::timeout(self.timeout, self.judge.classify(&input))
            .await
            .map_err(|_| {
                DomainError::RelationService(format!(
                    "{} timed out after {:?}",
                    self.judge.name(),
                    self.timeout
                ))
            })??;

        if !(0.0..=1.0).contains(&judgment.confidence) {
            return Err(DomainError::RelationService(format!(
                "{} returned confidence {} outside [0, 1]",
                self.judge.name(),
                judgment.confidence
            )));
        }
        Ok(RelationVerdict::classified(judgment.label, judgment.confidence))
    }

    /// Classify only when `similarity` is above the gate.
    ///
    /// Below the gate the pair is NEUTRAL with confidence 1 and the judge
    /// is never called. A failed call degrades to NEUTRAL with confidence
    /// 0 so one pair cannot fail the run.
    pub async fn judge_pair(&self, similarity: f64, text_a: &str, text_b: &str) -> RelationVerdict {
        if similarity.is_nan() || similarity <= self.gate {
            return RelationVerdict::below_gate();
        }
        match self.classify(text_a, text_b).await {
            Ok(verdict) => {
                debug!(
                    similarity,
                    label = %verdict.label,
                    confidence = verdict.confidence,
                    "Pair classified"
                );
                verdict
            }
            Err(e) => {
                warn!(error = %e, similarity, "Relation classification failed, degrading to NEUTRAL");
                RelationVerdict::degraded()
            }
        }
    }
}
