//! The pairwise decision policy.
//!
//! | similarity          | relation      | decision      |
//! |---------------------|---------------|---------------|
//! | `<= low_threshold`  | any           | Distinct      |
//! | `> low_threshold`   | ENTAILMENT    | Duplicate     |
//! | `> low_threshold`   | CONTRADICTION | Contradictory |
//! | `> low_threshold`   | NEUTRAL       | Ambiguous     |
//!
//! With the contrast veto enabled, a lexical contrast turns what would be
//! Duplicate into Contradictory. No other cell is affected.

use crate::domain::models::{Decision, PolicyConfig, RelationLabel};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionPolicy {
    pub low_threshold: f64,
    pub contrast_veto: bool,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self::from_config(&PolicyConfig::default())
    }
}

impl DecisionPolicy {
    pub fn new(low_threshold: f64, contrast_veto: bool) -> Self {
        Self {
            low_threshold,
            contrast_veto,
        }
    }

    pub fn from_config(config: &PolicyConfig) -> Self {
        Self::new(config.low_threshold, config.contrast_veto)
    }

    /// Total over all inputs. NaN similarity counts as not similar.
    pub fn decide(&self, similarity: f64, relation: RelationLabel, contrast: bool) -> Decision {
        if !(similarity > self.low_threshold) {
            return Decision::Distinct;
        }
        let decision = match relation {
            RelationLabel::Entailment => Decision::Duplicate,
            RelationLabel::Contradiction => Decision::Contradictory,
            RelationLabel::Neutral => Decision::Ambiguous,
        };
        self.veto(decision, contrast)
    }

    /// Apply the contrast veto to an already computed decision.
    pub fn veto(&self, decision: Decision, contrast: bool) -> Decision {
        if self.contrast_veto && contrast && decision == Decision::Duplicate {
            Decision::Contradictory
        } else {
            decision
        }
    }

    /// Fold per-role step decisions into one scenario-level decision.
    ///
    /// Any contradiction wins, then any distinct role; a scenario pair is
    /// duplicate only when every role is. An empty slice is Distinct.
    pub fn aggregate(decisions: &[Decision]) -> Decision {
        if decisions.is_empty() {
            return Decision::Distinct;
        }
        if decisions.contains(&Decision::Contradictory) {
            Decision::Contradictory
        } else if decisions.contains(&Decision::Distinct) {
            Decision::Distinct
        } else if decisions.iter().all(|d| *d == Decision::Duplicate) {
            Decision::Duplicate
        } else {
            Decision::Ambiguous
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LABELS: [RelationLabel; 3] = [
        RelationLabel::Entailment,
        RelationLabel::Contradiction,
        RelationLabel::Neutral,
    ];

    #[test]
    fn test_low_similarity_is_distinct_regardless() {
        let policy = DecisionPolicy::default();
        for label in LABELS {
            for contrast in [false, true] {
                assert_eq!(policy.decide(0.8, label, contrast), Decision::Distinct);
                assert_eq!(policy.decide(-0.5, label, contrast), Decision::Distinct);
                assert_eq!(policy.decide(f64::NAN, label, contrast), Decision::Distinct);
            }
        }
    }

    #[test]
    fn test_high_similarity_follows_relation() {
        let policy = DecisionPolicy::default();
        assert_eq!(policy.decide(0.92, RelationLabel::Entailment, false), Decision::Duplicate);
        assert_eq!(policy.decide(0.92, RelationLabel::Contradiction, false), Decision::Contradictory);
        assert_eq!(policy.decide(0.92, RelationLabel::Neutral, false), Decision::Ambiguous);
    }

    #[test]
    fn test_contrast_veto() {
        let policy = DecisionPolicy::default();
        for label in LABELS {
            assert_ne!(policy.decide(0.95, label, true), Decision::Duplicate);
        }
        assert_eq!(policy.decide(0.95, RelationLabel::Neutral, true), Decision::Ambiguous);

        let permissive = DecisionPolicy::new(0.8, false);
        assert_eq!(permissive.decide(0.95, RelationLabel::Entailment, true), Decision::Duplicate);
    }

    #[test]
    fn test_aggregate() {
        use Decision::*;
        assert_eq!(DecisionPolicy::aggregate(&[Duplicate, Duplicate, Duplicate]), Duplicate);
        assert_eq!(DecisionPolicy::aggregate(&[Duplicate, Contradictory, Distinct]), Contradictory);
        assert_eq!(DecisionPolicy::aggregate(&[Duplicate, Distinct]), Distinct);
        assert_eq!(DecisionPolicy::aggregate(&[Duplicate, Ambiguous]), Ambiguous);
        assert_eq!(DecisionPolicy::aggregate(&[]), Distinct);
    }
}
