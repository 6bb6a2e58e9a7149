//! Interchangeable reduction strategies and the engine that builds them.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info, instrument, warn};

use super::batch_reducer::BatchReducer;
use super::contrast_detector::ContrastDetector;
use super::decision_policy::DecisionPolicy;
use super::embedding_index::EmbeddingIndex;
use super::pair_judges::{StepwiseJudge, WholeScenarioJudge};
use super::relation_classifier::RelationClassifier;
use super::scenario_reducer::{reduce, Reduction};
use super::step_analysis::StepAnalyzer;
use super::step_extractor::extract_steps;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    AuditEntry, Config, DedupOutcome, DedupReport, DedupResult, ScenarioRecord, StepUnit,
    StrategyKind,
};
use crate::domain::ports::{BatchJudge, EmbeddingProvider, RelationJudge};

/// A complete reduction strategy: records in, partitioned result out.
#[async_trait]
pub trait DedupStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Run over `records`. Only an embedding failure is an error; every
    /// other failure is absorbed and shows up in the report.
    async fn run(&self, records: &[ScenarioRecord]) -> DomainResult<DedupOutcome>;
}

/// External collaborators, constructed once and shared by every component
/// of a run.
#[derive(Clone)]
pub struct Services {
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub relation: Arc<dyn RelationJudge>,
    pub batch: Arc<dyn BatchJudge>,
}

/// Whole-scenario similarity against a high threshold, with the contrast
/// veto on When+Then.
pub struct ThresholdStrategy {
    embedder: Arc<dyn EmbeddingProvider>,
    detector: ContrastDetector,
    policy: DecisionPolicy,
    threshold: f64,
}

impl ThresholdStrategy {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        detector: ContrastDetector,
        policy: DecisionPolicy,
        threshold: f64,
    ) -> Self {
        Self {
            embedder,
            detector,
            policy,
            threshold,
        }
    }
}

#[async_trait]
impl DedupStrategy for ThresholdStrategy {
    fn name(&self) -> &'static str {
        "threshold"
    }

    #[instrument(skip_all, fields(strategy = "threshold", records = records.len()))]
    async fn run(&self, records: &[ScenarioRecord]) -> DomainResult<DedupOutcome> {
        let texts: Vec<String> = records.iter().map(ScenarioRecord::render).collect();
        let index = EmbeddingIndex::build(self.embedder.as_ref(), &texts).await?;
        let judge =
            WholeScenarioJudge::new(records, &index, &self.detector, self.policy, self.threshold);
        let reduction = reduce(records, &judge).await;
        Ok(finish_reduction(self.name(), records, reduction))
    }
}

/// Stepwise similarity plus relation classification, decided per role and
/// folded into a scenario decision.
pub struct NliStrategy {
    embedder: Arc<dyn EmbeddingProvider>,
    classifier: RelationClassifier,
    detector: ContrastDetector,
    policy: DecisionPolicy,
}

impl NliStrategy {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        classifier: RelationClassifier,
        detector: ContrastDetector,
        policy: DecisionPolicy,
    ) -> Self {
        Self {
            embedder,
            classifier,
            detector,
            policy,
        }
    }
}

#[async_trait]
impl DedupStrategy for NliStrategy {
    fn name(&self) -> &'static str {
        "nli"
    }

    #[instrument(skip_all, fields(strategy = "nli", records = records.len()))]
    async fn run(&self, records: &[ScenarioRecord]) -> DomainResult<DedupOutcome> {
        let steps = extract_steps(records);
        let texts: Vec<String> = steps.iter().map(StepUnit::labeled).collect();
        let index = EmbeddingIndex::build(self.embedder.as_ref(), &texts).await?;
        let judge = StepwiseJudge::new(
            records,
            &steps,
            &index,
            &self.classifier,
            &self.detector,
            self.policy,
        );
        let reduction = reduce(records, &judge).await;
        Ok(finish_reduction(self.name(), records, reduction))
    }
}

/// Batch judgment by a generative model.
pub struct LlmStrategy {
    reducer: BatchReducer,
}

impl LlmStrategy {
    pub fn new(reducer: BatchReducer) -> Self {
        Self { reducer }
    }
}

#[async_trait]
impl DedupStrategy for LlmStrategy {
    fn name(&self) -> &'static str {
        "llm"
    }

    #[instrument(skip_all, fields(strategy = "llm", records = records.len()))]
    async fn run(&self, records: &[ScenarioRecord]) -> DomainResult<DedupOutcome> {
        let reduction = self.reducer.reduce(records).await;
        let mut report = DedupReport::new(self.name(), records.len());
        report.flagged_batches = reduction.flags;
        report.duplicate_pairs = reduction.duplicate_pairs;
        report.notices = reduction.notices;
        for flag in &report.flagged_batches {
            report.notices.push(format!(
                "Batch {} (scenarios {}..{}) kept unprocessed: {}",
                flag.batch, flag.start, flag.end, flag.reason
            ));
        }
        Ok(finish(records, reduction.result, report))
    }
}

fn finish_reduction(name: &str, records: &[ScenarioRecord], reduction: Reduction) -> DedupOutcome {
    let mut report = DedupReport::new(name, records.len());
    report.degraded_pairs = reduction.degraded_pairs;
    report.duplicate_pairs = reduction.duplicate_pairs;
    report.audit = reduction.evaluated.iter().map(AuditEntry::from).collect();
    if reduction.degraded_pairs > 0 {
        report.notices.push(format!(
            "{} pair classification(s) failed and were treated as NEUTRAL",
            reduction.degraded_pairs
        ));
    }
    finish(records, reduction.result, report)
}

/// Fill in the counts and malformed-record notices shared by all strategies.
fn finish(records: &[ScenarioRecord], result: DedupResult, mut report: DedupReport) -> DedupOutcome {
    for (index, record) in records.iter().enumerate() {
        if record.is_blank() {
            let notice = DomainError::MalformedRecord {
                index,
                reason: "no given, when or then text; kept without comparison".to_string(),
            };
            warn!(index, "Malformed scenario record");
            report.malformed.push(index);
            report.notices.push(notice.to_string());
        }
    }

    if let Err(violation) = result.check_partition(records.len()) {
        error!(violation = %violation, "Result does not partition the input");
        debug_assert!(false, "partition violated: {violation}");
    }

    report.kept_count = result.kept.len();
    report.removed_count = result.removed.len();
    info!(
        strategy = %report.strategy,
        input = report.input_count,
        kept = report.kept_count,
        removed = report.removed_count,
        degraded = report.degraded_pairs,
        flagged = report.flagged_batches.len(),
        "Deduplication run finished"
    );
    DedupOutcome { result, report }
}

/// Builds strategies and analyzers from configuration and services.
pub struct DedupEngine {
    config: Config,
    services: Services,
}

impl DedupEngine {
    pub fn new(config: Config, services: Services) -> Self {
        Self { config, services }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn embedder(&self) -> &dyn EmbeddingProvider {
        self.services.embedder.as_ref()
    }

    fn detector(&self) -> ContrastDetector {
        ContrastDetector::from_config(&self.config.contrast)
    }

    fn policy(&self) -> DecisionPolicy {
        DecisionPolicy::from_config(&self.config.policy)
    }

    fn classifier(&self) -> RelationClassifier {
        RelationClassifier::new(
            self.services.relation.clone(),
            self.config.policy.relation_gate,
            Duration::from_secs(self.config.relation.timeout_secs),
        )
        .with_separator(self.config.nli.separator.clone())
    }

    pub fn strategy(&self, kind: StrategyKind) -> Box<dyn DedupStrategy> {
        match kind {
            StrategyKind::Threshold => Box::new(ThresholdStrategy::new(
                self.services.embedder.clone(),
                self.detector(),
                self.policy(),
                self.config.threshold.threshold,
            )),
            StrategyKind::Nli => Box::new(NliStrategy::new(
                self.services.embedder.clone(),
                self.classifier(),
                self.detector(),
                self.policy(),
            )),
            StrategyKind::Llm => Box::new(LlmStrategy::new(BatchReducer::new(
                self.services.batch.clone(),
                &self.config.batch,
            ))),
        }
    }

    pub fn analyzer(&self) -> StepAnalyzer {
        StepAnalyzer::new(
            self.classifier(),
            self.detector(),
            self.policy(),
            self.config.relation.max_concurrency,
        )
    }

    /// Run the given strategy, or the configured default.
    pub async fn run(
        &self,
        kind: Option<StrategyKind>,
        records: &[ScenarioRecord],
    ) -> DomainResult<DedupOutcome> {
        self.strategy(kind.unwrap_or(self.config.strategy))
            .run(records)
            .await
    }
}
