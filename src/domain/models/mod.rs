//! Domain models for scenario deduplication.

pub mod config;
pub mod decision;
pub mod relation;
pub mod result;
pub mod scenario;
pub mod step;

pub use config::{
    BatchConfig, Config, ContrastConfig, EmbeddingConfig, EmbeddingProviderKind, JudgeConfig,
    LoggingConfig, NliConfig, PolicyConfig, RelationConfig, StrategyKind, ThresholdConfig,
};
pub use decision::{AuditEntry, Decision, PairDecision, PairMember};
pub use relation::{RelationLabel, RelationSource, RelationVerdict};
pub use result::{
    BatchFlag, DedupOutcome, DedupOutput, DedupReport, DedupResult, DuplicatePair, KeptScenario,
    RemovedOutput, RemovedScenario,
};
pub use scenario::{ScenarioRecord, ScenarioSet};
pub use step::{StepRole, StepUnit};
