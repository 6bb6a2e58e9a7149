//! Side-by-side comparison of two deduplication results.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::models::{DedupOutput, ScenarioRecord};

/// How much one result removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApproachSummary {
    pub name: String,
    pub kept: usize,
    pub removed: usize,
    pub original: usize,
    pub removal_rate: f64,
}

impl ApproachSummary {
    pub fn from_output(name: impl Into<String>, output: &DedupOutput) -> Self {
        let kept = output.features.len();
        let removed = output.removed.len();
        let original = kept + removed;
        let removal_rate = if original == 0 {
            0.0
        } else {
            removed as f64 / original as f64 * 100.0
        };
        Self {
            name: name.into(),
            kept,
            removed,
            original,
            removal_rate,
        }
    }
}

/// Overlap between the kept sets of two results, keyed by `given|when|then`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlapReport {
    pub common: usize,
    pub only_left: usize,
    pub only_right: usize,
    /// Common scenarios as a share of the left kept set, in percent.
    pub overlap_percent: f64,
    pub sample_only_left: Vec<String>,
    pub sample_only_right: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub left: ApproachSummary,
    pub right: ApproachSummary,
    pub overlap: OverlapReport,
}

pub fn compare(
    left_name: &str,
    left: &DedupOutput,
    right_name: &str,
    right: &DedupOutput,
    sample: usize,
) -> ComparisonReport {
    ComparisonReport {
        left: ApproachSummary::from_output(left_name, left),
        right: ApproachSummary::from_output(right_name, right),
        overlap: overlap(&left.features, &right.features, sample),
    }
}

pub fn overlap(left: &[ScenarioRecord], right: &[ScenarioRecord], sample: usize) -> OverlapReport {
    let left_keys: BTreeSet<String> = left.iter().map(ScenarioRecord::key).collect();
    let right_keys: BTreeSet<String> = right.iter().map(ScenarioRecord::key).collect();

    let common = left_keys.intersection(&right_keys).count();
    let only_left: Vec<&String> = left_keys.difference(&right_keys).collect();
    let only_right: Vec<&String> = right_keys.difference(&left_keys).collect();

    OverlapReport {
        common,
        only_left: only_left.len(),
        only_right: only_right.len(),
        overlap_percent: if left_keys.is_empty() {
            0.0
        } else {
            common as f64 / left_keys.len() as f64 * 100.0
        },
        sample_only_left: only_left.into_iter().take(sample).cloned().collect(),
        sample_only_right: only_right.into_iter().take(sample).cloned().collect(),
    }
}
