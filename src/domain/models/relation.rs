//! Natural language inference labels and verdicts.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Logical relation between two texts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationLabel {
    Entailment,
    Contradiction,
    Neutral,
}

impl RelationLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entailment => "ENTAILMENT",
            Self::Contradiction => "CONTRADICTION",
            Self::Neutral => "NEUTRAL",
        }
    }
}

impl std::fmt::Display for RelationLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationLabel {
    type Err = String;

    /// Case-insensitive. Also accepts the `LABEL_n` ids of MNLI heads
    /// (0 contradiction, 1 neutral, 2 entailment).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "entailment" | "label_2" => Ok(Self::Entailment),
            "contradiction" | "label_0" => Ok(Self::Contradiction),
            "neutral" | "label_1" => Ok(Self::Neutral),
            other => Err(format!("unknown relation label: {other}")),
        }
    }
}

/// Where a relation verdict came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationSource {
    /// Returned by the judgment service.
    Classified,
    /// Similarity was at or below the gate, classification skipped.
    BelowGate,
    /// The strategy does not classify and takes similarity as entailment.
    Assumed,
    /// The judgment service failed for this pair.
    Degraded,
}

/// A relation label with its confidence in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelationVerdict {
    pub label: RelationLabel,
    pub confidence: f64,
    pub source: RelationSource,
}

impl RelationVerdict {
    pub fn classified(label: RelationLabel, confidence: f64) -> Self {
        Self {
            label,
            confidence: confidence.clamp(0.0, 1.0),
            source: RelationSource::Classified,
        }
    }

    pub fn below_gate() -> Self {
        Self {
            label: RelationLabel::Neutral,
            confidence: 1.0,
            source: RelationSource::BelowGate,
        }
    }

    pub fn assumed_entailment() -> Self {
        Self {
            label: RelationLabel::Entailment,
            confidence: 1.0,
            source: RelationSource::Assumed,
        }
    }

    pub fn degraded() -> Self {
        Self {
            label: RelationLabel::Neutral,
            confidence: 0.0,
            source: RelationSource::Degraded,
        }
    }
}
