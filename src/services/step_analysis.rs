//! All-pairs step analysis.
//!
//! Every step is compared with every later step regardless of role, so the
//! audit table shows cross-role overlap too. Nothing is removed; the output
//! is the per-pair decisions and their counts.

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::contrast_detector::ContrastDetector;
use super::decision_policy::DecisionPolicy;
use super::embedding_index::EmbeddingIndex;
use super::relation_classifier::RelationClassifier;
use super::step_extractor::extract_steps;
use crate::domain::errors::DomainResult;
use crate::domain::models::{
    AuditEntry, Decision, PairDecision, PairMember, RelationSource, ScenarioRecord, StepUnit,
};
use crate::domain::ports::EmbeddingProvider;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub scenarios: usize,
    pub steps: usize,
    pub pairs: usize,
    pub classified: usize,
    pub degraded: usize,
    pub duplicate: usize,
    pub contradictory: usize,
    pub ambiguous: usize,
    pub distinct: usize,
}

#[derive(Debug, Clone)]
pub struct StepAnalysis {
    pub steps: Vec<StepUnit>,
    pub pairs: Vec<PairDecision>,
    pub summary: AnalysisSummary,
}

impl StepAnalysis {
    pub fn audit(&self) -> Vec<AuditEntry> {
        self.pairs.iter().map(AuditEntry::from).collect()
    }
}

pub struct StepAnalyzer {
    classifier: RelationClassifier,
    detector: ContrastDetector,
    policy: DecisionPolicy,
    concurrency: usize,
}

impl StepAnalyzer {
    pub fn new(
        classifier: RelationClassifier,
        detector: ContrastDetector,
        policy: DecisionPolicy,
        concurrency: usize,
    ) -> Self {
        Self {
            classifier,
            detector,
            policy,
            concurrency: concurrency.max(1),
        }
    }

    /// Number of pairs `analyze` will evaluate for `records`.
    pub fn pair_count(records: &[ScenarioRecord]) -> usize {
        let n = extract_steps(records).len();
        n * n.saturating_sub(1) / 2
    }

    /// Compare all step pairs. `on_pair` is called once per finished pair.
    #[instrument(skip_all, fields(records = records.len()))]
    pub async fn analyze<F>(
        &self,
        provider: &dyn EmbeddingProvider,
        records: &[ScenarioRecord],
        on_pair: F,
    ) -> DomainResult<StepAnalysis>
    where
        F: Fn() + Send + Sync,
    {
        let steps = extract_steps(records);
        let texts: Vec<String> = steps.iter().map(StepUnit::labeled).collect();
        let index = EmbeddingIndex::build(provider, &texts).await?;

        let n = steps.len();
        let candidates = (0..n).flat_map(|i| ((i + 1)..n).map(move |j| (i, j)));

        let pairs: Vec<PairDecision> = stream::iter(candidates)
            .map(|(i, j)| {
                let (steps, texts, index, on_pair) = (&steps, &texts, &index, &on_pair);
                async move {
                    let similarity = index.similarity(i, j);
                    let relation = self
                        .classifier
                        .judge_pair(similarity, &texts[i], &texts[j])
                        .await;
                    let contrast = self.detector.has_contrast(&steps[i].text, &steps[j].text);
                    let decision = self.policy.decide(similarity, relation.label, contrast);
                    on_pair();
                    PairDecision {
                        left: member(&steps[i]),
                        right: member(&steps[j]),
                        similarity,
                        relation,
                        contrast,
                        decision,
                    }
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let summary = summarize(records.len(), n, &pairs);
        info!(
            steps = summary.steps,
            pairs = summary.pairs,
            duplicate = summary.duplicate,
            contradictory = summary.contradictory,
            degraded = summary.degraded,
            "Step analysis complete"
        );
        Ok(StepAnalysis {
            steps,
            pairs,
            summary,
        })
    }
}

fn member(step: &StepUnit) -> PairMember {
    PairMember {
        scenario_index: step.scenario_index,
        role: Some(step.role),
        text: step.text.clone(),
    }
}

fn summarize(scenarios: usize, steps: usize, pairs: &[PairDecision]) -> AnalysisSummary {
    let mut summary = AnalysisSummary {
        scenarios,
        steps,
        pairs: pairs.len(),
        ..Default::default()
    };
    for pair in pairs {
        match pair.relation.source {
            RelationSource::Classified => summary.classified += 1,
            RelationSource::Degraded => summary.degraded += 1,
            RelationSource::BelowGate | RelationSource::Assumed => {}
        }
        match pair.decision {
            Decision::Duplicate => summary.duplicate += 1,
            Decision::Contradictory => summary.contradictory += 1,
            Decision::Ambiguous => summary.ambiguous += 1,
            Decision::Distinct => summary.distinct += 1,
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::embeddings::HashedEmbeddingProvider;
    use crate::domain::ports::NullRelationJudge;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_all_pairs_counted() {
        let records = vec![
            ScenarioRecord::new("user logged in", "clicks submit", "form is saved"),
            ScenarioRecord::new("user logged in", "clicks submit", "form is saved"),
        ];
        let classifier = RelationClassifier::new(
            Arc::new(NullRelationJudge::new()),
            0.6,
            Duration::from_secs(1),
        );
        let analyzer = StepAnalyzer::new(
            classifier,
            ContrastDetector::default(),
            DecisionPolicy::default(),
            2,
        );
        let provider = HashedEmbeddingProvider::new(64);
        let calls = AtomicUsize::new(0);

        let analysis = analyzer
            .analyze(&provider, &records, || {
                calls.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();

        assert_eq!(analysis.summary.steps, 6);
        assert_eq!(analysis.summary.pairs, 15);
        assert_eq!(StepAnalyzer::pair_count(&records), 15);
        assert_eq!(calls.load(Ordering::SeqCst), 15);
        // Identical steps clear the gate, and the null judge degrades them.
        assert_eq!(analysis.summary.degraded, 3);
        assert_eq!(analysis.summary.ambiguous, 3);
        assert_eq!(analysis.audit().len(), 15);
        assert_eq!(
            analysis.summary.duplicate
                + analysis.summary.contradictory
                + analysis.summary.ambiguous
                + analysis.summary.distinct,
            15
        );
    }
}
