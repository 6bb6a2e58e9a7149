//! Batch judgment reduction.
//!
//! The collection is cut into contiguous batches and each batch is judged
//! independently, so duplicates that straddle a batch boundary are never
//! detected. A batch whose judgment fails or cannot be understood is kept
//! whole and flagged.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use super::judgment_parser::{self, BatchVerdict, VerdictEntry};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    BatchConfig, BatchFlag, DedupResult, DuplicatePair, KeptScenario, RemovedScenario,
    ScenarioRecord,
};
use crate::domain::ports::{BatchItem, BatchJudge, FailureKind, JudgmentResponse};

const DEFAULT_REMOVE_REASON: &str = "Removed by batch judgment";

/// What a batch reduction produced.
#[derive(Debug, Clone, Default)]
pub struct BatchReduction {
    pub result: DedupResult,
    pub flags: Vec<BatchFlag>,
    pub duplicate_pairs: Vec<DuplicatePair>,
    pub notices: Vec<String>,
}

#[derive(Debug, Clone)]
struct BatchPlan {
    batch: usize,
    start: usize,
    end: usize,
    items: Vec<BatchItem>,
}

#[derive(Debug, Default)]
struct Removal {
    reason: String,
    duplicate_of: Option<usize>,
}

#[derive(Clone)]
pub struct BatchReducer {
    judge: Arc<dyn BatchJudge>,
    batch_size: usize,
    max_concurrency: usize,
    timeout: Duration,
}

impl BatchReducer {
    pub fn new(judge: Arc<dyn BatchJudge>, config: &BatchConfig) -> Self {
        Self {
            judge,
            batch_size: config.batch_size.max(1),
            max_concurrency: config.max_concurrency.max(1),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Reduce `records` batch by batch.
    ///
    /// Blank records are never sent to the judge and are always kept.
    #[instrument(skip_all, fields(judge = self.judge.name(), records = records.len()))]
    pub async fn reduce(&self, records: &[ScenarioRecord]) -> BatchReduction {
        let plans = self.plan(records);
        info!(
            batches = plans.len(),
            batch_size = self.batch_size,
            concurrency = self.max_concurrency,
            "Starting batch judgment"
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut handles = Vec::with_capacity(plans.len());

        for plan in &plans {
            if plan.items.is_empty() {
                handles.push(None);
                continue;
            }
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                handles.push(None);
                continue;
            };
            let judge = self.judge.clone();
            let items = plan.items.clone();
            let timeout = self.timeout;

            let handle = tokio::spawn(async move {
                let _permit = permit;
                match tokio::time::timeout(timeout, judge.judge_batch(&items)).await {
                    Ok(response) => response,
                    Err(_) => JudgmentResponse::failure(
                        FailureKind::Timeout,
                        format!("no response within {timeout:?}"),
                    ),
                }
            });
            handles.push(Some(handle));
        }

        let mut removals: BTreeMap<usize, Removal> = BTreeMap::new();
        let mut reduction = BatchReduction::default();

        for (plan, handle) in plans.iter().zip(handles) {
            let Some(handle) = handle else { continue };
            let response = match handle.await {
                Ok(response) => response,
                Err(e) => JudgmentResponse::failure(FailureKind::Transport, e.to_string()),
            };

            let outcome =
                judgment_parser::interpret(response).and_then(|verdict| reconcile(plan, verdict));
            match outcome {
                Ok(reconciled) => {
                    debug!(
                        batch = plan.batch,
                        removed = reconciled.removals.len(),
                        "Batch judged"
                    );
                    reduction.notices.extend(reconciled.notices);
                    removals.extend(reconciled.removals);
                }
                Err(e) => {
                    warn!(batch = plan.batch, start = plan.start, end = plan.end, error = %e,
                        "Batch kept unmodified");
                    reduction.flags.push(BatchFlag {
                        batch: plan.batch,
                        start: plan.start,
                        end: plan.end,
                        reason: e.to_string(),
                    });
                }
            }
        }

        for (index, record) in records.iter().enumerate() {
            match removals.remove(&index) {
                Some(removal) => {
                    if let Some(original) = removal.duplicate_of {
                        reduction.duplicate_pairs.push(DuplicatePair {
                            original_index: original,
                            duplicate_index: index,
                            similarity: 1.0,
                        });
                    }
                    reduction.result.removed.push(RemovedScenario {
                        index,
                        record: record.clone(),
                        reason: removal.reason,
                        duplicate_of: removal.duplicate_of,
                    });
                }
                None => reduction.result.kept.push(KeptScenario {
                    index,
                    record: record.clone(),
                }),
            }
        }

        info!(
            kept = reduction.result.kept.len(),
            removed = reduction.result.removed.len(),
            flagged = reduction.flags.len(),
            "Batch judgment complete"
        );
        reduction
    }

    fn plan(&self, records: &[ScenarioRecord]) -> Vec<BatchPlan> {
        (0..records.len())
            .step_by(self.batch_size)
            .enumerate()
            .map(|(batch, start)| {
                let end = (start + self.batch_size).min(records.len());
                let items = (start..end)
                    .filter(|&id| !records[id].is_blank())
                    .map(|id| BatchItem {
                        id,
                        record: records[id].clone(),
                    })
                    .collect();
                BatchPlan {
                    batch,
                    start,
                    end,
                    items,
                }
            })
            .collect()
    }
}

#[derive(Debug, Default)]
struct Reconciled {
    removals: BTreeMap<usize, Removal>,
    notices: Vec<String>,
}

/// Map removed entries back onto batch members, by id when the judge
/// echoed one and by exact field match otherwise.
fn reconcile(plan: &BatchPlan, verdict: BatchVerdict) -> DomainResult<Reconciled> {
    let member_ids: HashSet<usize> = plan.items.iter().map(|item| item.id).collect();
    let kept_ids: HashSet<usize> = verdict
        .kept
        .iter()
        .filter_map(|entry| entry.id)
        .filter(|id| member_ids.contains(id))
        .collect();
    let mut reconciled = Reconciled::default();

    for entry in verdict.removed {
        let Some(index) = resolve(plan, &member_ids, &reconciled.removals, &entry) else {
            reconciled.notices.push(format!(
                "Batch {}: removed entry {} matches no unclaimed scenario; ignored",
                plan.batch,
                entry.record.key()
            ));
            continue;
        };
        let duplicate_of = entry
            .duplicate_of
            .filter(|original| *original != index && member_ids.contains(original));
        reconciled.removals.insert(
            index,
            Removal {
                reason: entry
                    .reason
                    .unwrap_or_else(|| DEFAULT_REMOVE_REASON.to_string()),
                duplicate_of,
            },
        );
    }

    if !plan.items.is_empty() && reconciled.removals.len() == plan.items.len() {
        return Err(DomainError::JudgmentFormat(
            "verdict removes every scenario in the batch".to_string(),
        ));
    }
    if let Some(index) = reconciled.removals.keys().find(|index| kept_ids.contains(index)) {
        return Err(DomainError::JudgmentFormat(format!(
            "verdict both keeps and removes scenario {index}"
        )));
    }
    // A removal must point at a scenario that survives.
    let orphaned = reconciled.removals.iter().find_map(|(index, removal)| {
        removal
            .duplicate_of
            .filter(|original| reconciled.removals.contains_key(original))
            .map(|original| (*index, original))
    });
    if let Some((index, original)) = orphaned {
        return Err(DomainError::JudgmentFormat(format!(
            "scenario {index} is removed as a duplicate of {original}, which is removed too"
        )));
    }
    Ok(reconciled)
}

fn resolve(
    plan: &BatchPlan,
    member_ids: &HashSet<usize>,
    claimed: &BTreeMap<usize, Removal>,
    entry: &VerdictEntry,
) -> Option<usize> {
    if let Some(id) = entry.id {
        if member_ids.contains(&id) && !claimed.contains_key(&id) {
            return Some(id);
        }
    }
    plan.items
        .iter()
        .find(|item| item.record == entry.record && !claimed.contains_key(&item.id))
        .map(|item| item.id)
}
