//! Deduplication results and run reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::decision::AuditEntry;
use super::scenario::ScenarioRecord;

/// A scenario that survived deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeptScenario {
    pub index: usize,
    pub record: ScenarioRecord,
}

/// A scenario removed as a duplicate, with the rationale preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovedScenario {
    pub index: usize,
    pub record: ScenarioRecord,
    pub reason: String,
    /// Index of the surviving scenario this one duplicates, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicate_of: Option<usize>,
}

/// Kept and removed scenarios. Together they partition the input by index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupResult {
    pub kept: Vec<KeptScenario>,
    pub removed: Vec<RemovedScenario>,
}

impl DedupResult {
    /// Verify that every index in `0..input_len` appears exactly once.
    pub fn check_partition(&self, input_len: usize) -> Result<(), String> {
        let mut seen = vec![false; input_len];
        let indices = self
            .kept
            .iter()
            .map(|k| k.index)
            .chain(self.removed.iter().map(|r| r.index));
        for index in indices {
            match seen.get_mut(index) {
                None => return Err(format!("index {index} is outside the input")),
                Some(true) => return Err(format!("index {index} appears more than once")),
                Some(slot) => *slot = true,
            }
        }
        match seen.iter().position(|s| !s) {
            Some(missing) => Err(format!("index {missing} is missing from the result")),
            None => Ok(()),
        }
    }

    pub fn kept_records(&self) -> Vec<ScenarioRecord> {
        self.kept.iter().map(|k| k.record.clone()).collect()
    }

    /// Serializable `{features, removed}` document.
    pub fn to_output(&self) -> DedupOutput {
        DedupOutput {
            features: self.kept_records(),
            removed: self
                .removed
                .iter()
                .map(|r| RemovedOutput {
                    given: r.record.given.clone(),
                    when: r.record.when.clone(),
                    then: r.record.then.clone(),
                    reason: r.reason.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupOutput {
    pub features: Vec<ScenarioRecord>,
    #[serde(default)]
    pub removed: Vec<RemovedOutput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovedOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub then: Option<String>,
    pub reason: String,
}

/// A batch the judgment service could not process; its scenarios were kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFlag {
    pub batch: usize,
    pub start: usize,
    pub end: usize,
    pub reason: String,
}

/// A duplicate pair found by a similarity strategy, for the duplicate report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicatePair {
    pub original_index: usize,
    pub duplicate_index: usize,
    pub similarity: f64,
}

/// Everything a run observed besides the partition itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupReport {
    pub run_id: Uuid,
    pub strategy: String,
    pub started_at: DateTime<Utc>,
    pub input_count: usize,
    pub kept_count: usize,
    pub removed_count: usize,
    /// Pairs whose relation classification failed and fell back to NEUTRAL.
    pub degraded_pairs: usize,
    pub flagged_batches: Vec<BatchFlag>,
    /// Records with no usable field.
    pub malformed: Vec<usize>,
    pub duplicate_pairs: Vec<DuplicatePair>,
    pub audit: Vec<AuditEntry>,
    pub notices: Vec<String>,
}

impl DedupReport {
    pub fn new(strategy: impl Into<String>, input_count: usize) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            strategy: strategy.into(),
            started_at: Utc::now(),
            input_count,
            kept_count: 0,
            removed_count: 0,
            degraded_pairs: 0,
            flagged_batches: Vec::new(),
            malformed: Vec::new(),
            duplicate_pairs: Vec::new(),
            audit: Vec::new(),
            notices: Vec::new(),
        }
    }

    pub fn removal_rate(&self) -> f64 {
        if self.input_count == 0 {
            0.0
        } else {
            self.removed_count as f64 / self.input_count as f64 * 100.0
        }
    }

    /// Duplicate pairs ordered by similarity, highest first.
    pub fn top_duplicates(&self, limit: usize) -> Vec<DuplicatePair> {
        let mut pairs = self.duplicate_pairs.clone();
        pairs.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        pairs.truncate(limit);
        pairs
    }
}

/// The outcome of one deduplication run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupOutcome {
    pub result: DedupResult,
    pub report: DedupReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kept(index: usize) -> KeptScenario {
        KeptScenario {
            index,
            record: ScenarioRecord::default(),
        }
    }

    fn removed(index: usize) -> RemovedScenario {
        RemovedScenario {
            index,
            record: ScenarioRecord::default(),
            reason: "dup".into(),
            duplicate_of: Some(0),
        }
    }

    #[test]
    fn test_partition_ok() {
        let result = DedupResult {
            kept: vec![kept(0), kept(2)],
            removed: vec![removed(1)],
        };
        assert!(result.check_partition(3).is_ok());
    }

    #[test]
    fn test_partition_detects_duplicates_and_gaps() {
        let doubled = DedupResult {
            kept: vec![kept(0), kept(1)],
            removed: vec![removed(1)],
        };
        assert!(doubled.check_partition(2).unwrap_err().contains("more than once"));

        let gap = DedupResult {
            kept: vec![kept(0)],
            removed: vec![],
        };
        assert!(gap.check_partition(2).unwrap_err().contains("missing"));

        let outside = DedupResult {
            kept: vec![kept(5)],
            removed: vec![],
        };
        assert!(outside.check_partition(1).unwrap_err().contains("outside"));
    }

    #[test]
    fn test_output_shape() {
        let result = DedupResult {
            kept: vec![KeptScenario {
                index: 0,
                record: ScenarioRecord::new("g", "w", "t"),
            }],
            removed: vec![RemovedScenario {
                index: 1,
                record: ScenarioRecord::new("g", "w", "t2"),
                reason: "Duplicate of scenario 0".into(),
                duplicate_of: Some(0),
            }],
        };
        let json = serde_json::to_value(result.to_output()).unwrap();
        assert_eq!(json["features"][0]["given"], "g");
        assert_eq!(json["removed"][0]["then"], "t2");
        assert_eq!(json["removed"][0]["reason"], "Duplicate of scenario 0");
    }

    #[test]
    fn test_top_duplicates_sorted() {
        let mut report = DedupReport::new("threshold", 4);
        report.duplicate_pairs = vec![
            DuplicatePair { original_index: 0, duplicate_index: 1, similarity: 0.91 },
            DuplicatePair { original_index: 0, duplicate_index: 2, similarity: 0.99 },
            DuplicatePair { original_index: 2, duplicate_index: 3, similarity: 0.95 },
        ];
        let top = report.top_duplicates(2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].duplicate_index, 2);
        assert_eq!(top[1].duplicate_index, 3);
    }

    #[test]
    fn test_removal_rate() {
        let mut report = DedupReport::new("llm", 0);
        assert!(report.removal_rate().abs() < f64::EPSILON);
        report.input_count = 8;
        report.removed_count = 2;
        assert!((report.removal_rate() - 25.0).abs() < 1e-9);
    }
}
