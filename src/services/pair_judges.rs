//! Scenario pair judges used by the reducer.

use std::collections::HashMap;

use async_trait::async_trait;

use super::contrast_detector::ContrastDetector;
use super::decision_policy::DecisionPolicy;
use super::embedding_index::EmbeddingIndex;
use super::relation_classifier::RelationClassifier;
use super::scenario_reducer::{ScenarioPairJudge, ScenarioVerdict};
use crate::domain::models::{
    Decision, PairDecision, PairMember, RelationVerdict, ScenarioRecord, StepRole, StepUnit,
};

/// Whole-scenario cosine comparison with the contrast veto.
///
/// `index` holds one vector per record, built from [`ScenarioRecord::render`].
/// A pair is a duplicate when its similarity exceeds `threshold` and the
/// When+Then texts carry no lexical contrast.
pub struct WholeScenarioJudge<'a> {
    records: &'a [ScenarioRecord],
    index: &'a EmbeddingIndex,
    detector: &'a ContrastDetector,
    policy: DecisionPolicy,
    threshold: f64,
}

impl<'a> WholeScenarioJudge<'a> {
    pub fn new(
        records: &'a [ScenarioRecord],
        index: &'a EmbeddingIndex,
        detector: &'a ContrastDetector,
        policy: DecisionPolicy,
        threshold: f64,
    ) -> Self {
        Self {
            records,
            index,
            detector,
            policy,
            threshold,
        }
    }

    fn member(&self, i: usize) -> PairMember {
        PairMember {
            scenario_index: i,
            role: None,
            text: self.records[i].render(),
        }
    }
}

#[async_trait]
impl ScenarioPairJudge for WholeScenarioJudge<'_> {
    async fn judge(&self, left: usize, right: usize) -> ScenarioVerdict {
        let similarity = self.index.similarity(left, right);
        if !(similarity > self.threshold) {
            return ScenarioVerdict {
                decision: Decision::Distinct,
                similarity,
                pairs: Vec::new(),
            };
        }

        let contrast = self.detector.has_contrast(
            &self.records[left].outcome_text(),
            &self.records[right].outcome_text(),
        );
        let decision = self.policy.veto(Decision::Duplicate, contrast);
        let pair = PairDecision {
            left: self.member(left),
            right: self.member(right),
            similarity,
            relation: RelationVerdict::assumed_entailment(),
            contrast,
            decision,
        };
        ScenarioVerdict {
            decision,
            similarity,
            pairs: vec![pair],
        }
    }
}

/// Step-by-step comparison: each shared role is embedded, gated through
/// the relation classifier and decided by the policy, then folded into one
/// scenario-level decision.
///
/// Scenarios with different role sets are Distinct. The scenario
/// similarity is the weakest role similarity, and the contrast veto is
/// applied again on the When+Then texts.
pub struct StepwiseJudge<'a> {
    records: &'a [ScenarioRecord],
    steps: &'a [StepUnit],
    index: &'a EmbeddingIndex,
    classifier: &'a RelationClassifier,
    detector: &'a ContrastDetector,
    policy: DecisionPolicy,
    lookup: HashMap<(usize, StepRole), usize>,
}

impl<'a> StepwiseJudge<'a> {
    /// `index` must hold one vector per entry of `steps`, built from
    /// [`StepUnit::labeled`].
    pub fn new(
        records: &'a [ScenarioRecord],
        steps: &'a [StepUnit],
        index: &'a EmbeddingIndex,
        classifier: &'a RelationClassifier,
        detector: &'a ContrastDetector,
        policy: DecisionPolicy,
    ) -> Self {
        let lookup = steps
            .iter()
            .enumerate()
            .map(|(position, step)| ((step.scenario_index, step.role), position))
            .collect();
        Self {
            records,
            steps,
            index,
            classifier,
            detector,
            policy,
            lookup,
        }
    }

    fn member(step: &StepUnit) -> PairMember {
        PairMember {
            scenario_index: step.scenario_index,
            role: Some(step.role),
            text: step.text.clone(),
        }
    }

    async fn judge_role(&self, a: usize, b: usize) -> PairDecision {
        let (left, right) = (&self.steps[a], &self.steps[b]);
        let similarity = self.index.similarity(a, b);
        let relation = self
            .classifier
            .judge_pair(similarity, &left.labeled(), &right.labeled())
            .await;
        let contrast = self.detector.has_contrast(&left.text, &right.text);
        let decision = self.policy.decide(similarity, relation.label, contrast);
        PairDecision {
            left: Self::member(left),
            right: Self::member(right),
            similarity,
            relation,
            contrast,
            decision,
        }
    }
}

#[async_trait]
impl ScenarioPairJudge for StepwiseJudge<'_> {
    async fn judge(&self, left: usize, right: usize) -> ScenarioVerdict {
        let roles = self.records[left].present_roles();
        if roles != self.records[right].present_roles() {
            return ScenarioVerdict {
                decision: Decision::Distinct,
                similarity: 0.0,
                pairs: Vec::new(),
            };
        }

        let mut pairs = Vec::with_capacity(roles.len());
        for role in roles {
            let (Some(&a), Some(&b)) = (
                self.lookup.get(&(left, role)),
                self.lookup.get(&(right, role)),
            ) else {
                continue;
            };
            pairs.push(self.judge_role(a, b).await);
        }

        let decisions: Vec<Decision> = pairs.iter().map(|p| p.decision).collect();
        let similarity = pairs
            .iter()
            .map(|p| p.similarity)
            .fold(f64::INFINITY, f64::min);
        let similarity = if similarity.is_finite() { similarity } else { 0.0 };

        let outcome_contrast = self.detector.has_contrast(
            &self.records[left].outcome_text(),
            &self.records[right].outcome_text(),
        );
        let decision = self
            .policy
            .veto(DecisionPolicy::aggregate(&decisions), outcome_contrast);

        ScenarioVerdict {
            decision,
            similarity,
            pairs,
        }
    }
}
