//! Pairwise deduplication decisions and their flat audit form.

use serde::{Deserialize, Serialize};

use super::relation::{RelationLabel, RelationVerdict};
use super::step::StepRole;

/// Outcome of comparing two steps or two scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Duplicate,
    Contradictory,
    Ambiguous,
    Distinct,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Duplicate => write!(f, "duplicate"),
            Self::Contradictory => write!(f, "contradictory"),
            Self::Ambiguous => write!(f, "ambiguous"),
            Self::Distinct => write!(f, "distinct"),
        }
    }
}

/// One side of an evaluated pair.
///
/// `role` is `None` when the whole scenario was compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairMember {
    pub scenario_index: usize,
    pub role: Option<StepRole>,
    pub text: String,
}

impl PairMember {
    pub fn display_text(&self) -> String {
        match self.role {
            Some(role) => format!("{role}: {}", self.text),
            None => self.text.clone(),
        }
    }
}

/// A fully evaluated pair. A pure function of its inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairDecision {
    pub left: PairMember,
    pub right: PairMember,
    pub similarity: f64,
    pub relation: RelationVerdict,
    pub contrast: bool,
    pub decision: Decision,
}

/// Flat audit row, one per evaluated pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub step_a: String,
    pub step_b: String,
    pub scenario_a: usize,
    pub scenario_b: usize,
    pub similarity: f64,
    pub relation_label: RelationLabel,
    pub confidence: f64,
    pub contrast: bool,
    pub decision: Decision,
}

impl From<&PairDecision> for AuditEntry {
    fn from(pair: &PairDecision) -> Self {
        Self {
            step_a: pair.left.display_text(),
            step_b: pair.right.display_text(),
            scenario_a: pair.left.scenario_index,
            scenario_b: pair.right.scenario_index,
            similarity: round4(pair.similarity),
            relation_label: pair.relation.label,
            confidence: round4(pair.relation.confidence),
            contrast: pair.contrast,
            decision: pair.decision,
        }
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
