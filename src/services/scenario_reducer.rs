//! Scenario-level reduction over pairwise decisions.
//!
//! Every scenario starts unseen. Scenarios are visited in ascending index
//! order; an unseen scenario `i` is compared with every later scenario `j`
//! that is still unseen, each `j` judged a duplicate is removed with a
//! reason naming `i`, and `i` is then kept. The earlier scenario always
//! survives and a removed scenario never anchors further removals, so each
//! removal has exactly one reason. Removal is not closed transitively.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::domain::models::{
    Decision, DedupResult, DuplicatePair, KeptScenario, PairDecision, RelationSource,
    RemovedScenario, ScenarioRecord,
};

/// Scenario-level verdict for one pair, with the step pairs behind it.
#[derive(Debug, Clone)]
pub struct ScenarioVerdict {
    pub decision: Decision,
    pub similarity: f64,
    pub pairs: Vec<PairDecision>,
}

/// Decides whether scenario `right` duplicates scenario `left`.
#[async_trait]
pub trait ScenarioPairJudge: Send + Sync {
    async fn judge(&self, left: usize, right: usize) -> ScenarioVerdict;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScenarioState {
    Unseen,
    Kept,
    Removed,
}

/// What a reduction produced.
#[derive(Debug, Clone, Default)]
pub struct Reduction {
    pub result: DedupResult,
    pub evaluated: Vec<PairDecision>,
    pub duplicate_pairs: Vec<DuplicatePair>,
    pub degraded_pairs: usize,
    pub comparisons: usize,
}

/// Run the reduction. Blank records take part in no comparison and are kept.
pub async fn reduce<J>(records: &[ScenarioRecord], judge: &J) -> Reduction
where
    J: ScenarioPairJudge + ?Sized,
{
    let n = records.len();
    let mut states = vec![ScenarioState::Unseen; n];
    let mut reasons: Vec<Option<(String, usize)>> = vec![None; n];
    let mut reduction = Reduction::default();

    for i in 0..n {
        if states[i] != ScenarioState::Unseen {
            continue;
        }
        if !records[i].is_blank() {
            for j in (i + 1)..n {
                if states[j] != ScenarioState::Unseen || records[j].is_blank() {
                    continue;
                }
                let verdict = judge.judge(i, j).await;
                reduction.comparisons += 1;
                reduction.degraded_pairs += verdict
                    .pairs
                    .iter()
                    .filter(|p| p.relation.source == RelationSource::Degraded)
                    .count();

                if verdict.decision == Decision::Duplicate {
                    debug!(kept = i, removed = j, similarity = verdict.similarity, "Duplicate found");
                    states[j] = ScenarioState::Removed;
                    reasons[j] = Some((
                        format!(
                            "Duplicate of scenario {i} (similarity {:.3})",
                            verdict.similarity
                        ),
                        i,
                    ));
                    reduction.duplicate_pairs.push(DuplicatePair {
                        original_index: i,
                        duplicate_index: j,
                        similarity: verdict.similarity,
                    });
                }
                reduction.evaluated.extend(verdict.pairs);
            }
        }
        states[i] = ScenarioState::Kept;
    }

    for (index, (state, reason)) in states.into_iter().zip(reasons).enumerate() {
        let record = records[index].clone();
        match (state, reason) {
            (ScenarioState::Removed, Some((reason, anchor))) => {
                reduction.result.removed.push(RemovedScenario {
                    index,
                    record,
                    reason,
                    duplicate_of: Some(anchor),
                });
            }
            _ => reduction.result.kept.push(KeptScenario { index, record }),
        }
    }

    info!(
        input = n,
        kept = reduction.result.kept.len(),
        removed = reduction.result.removed.len(),
        comparisons = reduction.comparisons,
        "Scenario reduction complete"
    );
    reduction
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Duplicate iff the pair is listed.
    struct ListJudge {
        duplicates: HashSet<(usize, usize)>,
        calls: Mutex<Vec<(usize, usize)>>,
    }

    impl ListJudge {
        fn new(pairs: &[(usize, usize)]) -> Self {
            Self {
                duplicates: pairs.iter().copied().collect(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ScenarioPairJudge for ListJudge {
        async fn judge(&self, left: usize, right: usize) -> ScenarioVerdict {
            self.calls.lock().unwrap().push((left, right));
            let duplicate = self.duplicates.contains(&(left, right));
            ScenarioVerdict {
                decision: if duplicate { Decision::Duplicate } else { Decision::Distinct },
                similarity: if duplicate { 0.95 } else { 0.1 },
                pairs: Vec::new(),
            }
        }
    }

    fn records(n: usize) -> Vec<ScenarioRecord> {
        (0..n)
            .map(|i| ScenarioRecord::new(format!("g{i}"), format!("w{i}"), format!("t{i}")))
            .collect()
    }

    #[tokio::test]
    async fn test_earlier_index_survives() {
        let judge = ListJudge::new(&[(0, 2)]);
        let reduction = reduce(&records(3), &judge).await;
        let kept: Vec<usize> = reduction.result.kept.iter().map(|k| k.index).collect();
        assert_eq!(kept, vec![0, 1]);
        assert_eq!(reduction.result.removed[0].index, 2);
        assert_eq!(reduction.result.removed[0].duplicate_of, Some(0));
        assert!(reduction.result.removed[0].reason.starts_with("Duplicate of scenario 0"));
        assert!(reduction.result.check_partition(3).is_ok());
    }

    #[tokio::test]
    async fn test_removed_scenario_is_never_compared_again() {
        // 0 removes 1; the (1, 2) duplicate must not fire since 1 is gone.
        let judge = ListJudge::new(&[(0, 1), (1, 2)]);
        let reduction = reduce(&records(3), &judge).await;
        let calls = judge.calls.lock().unwrap().clone();
        assert_eq!(calls, vec![(0, 1), (0, 2)]);
        assert_eq!(reduction.result.removed.len(), 1);
        assert_eq!(reduction.result.kept.len(), 2);
    }

    #[tokio::test]
    async fn test_first_match_wins() {
        let judge = ListJudge::new(&[(0, 2), (1, 2)]);
        let reduction = reduce(&records(3), &judge).await;
        assert_eq!(reduction.result.removed.len(), 1);
        assert_eq!(reduction.result.removed[0].duplicate_of, Some(0));
    }

    #[tokio::test]
    async fn test_blank_records_kept_without_comparisons() {
        let mut input = records(3);
        input[1] = ScenarioRecord::default();
        let judge = ListJudge::new(&[(0, 1), (0, 2)]);
        let reduction = reduce(&input, &judge).await;
        let calls = judge.calls.lock().unwrap().clone();
        assert_eq!(calls, vec![(0, 2)]);
        let kept: Vec<usize> = reduction.result.kept.iter().map(|k| k.index).collect();
        assert_eq!(kept, vec![0, 1]);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let judge = ListJudge::new(&[]);
        let reduction = reduce(&[], &judge).await;
        assert!(reduction.result.kept.is_empty());
        assert!(reduction.result.removed.is_empty());
    }
}
