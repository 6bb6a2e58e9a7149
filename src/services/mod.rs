pub mod batch_reducer;
pub mod comparison;
pub mod contrast_detector;
pub mod decision_policy;
pub mod embedding_index;
pub mod judgment_parser;
pub mod pair_judges;
pub mod relation_classifier;
pub mod scenario_reducer;
pub mod step_analysis;
pub mod step_extractor;
pub mod strategy;

pub use batch_reducer::{BatchReducer, BatchReduction};
pub use comparison::{compare, ApproachSummary, ComparisonReport, OverlapReport};
pub use contrast_detector::ContrastDetector;
pub use decision_policy::DecisionPolicy;
pub use embedding_index::{cosine_similarity, similarity_matrix, EmbeddingIndex};
pub use judgment_parser::{extract_json_from_response, BatchVerdict, VerdictEntry};
pub use pair_judges::{StepwiseJudge, WholeScenarioJudge};
pub use relation_classifier::RelationClassifier;
pub use scenario_reducer::{reduce, Reduction, ScenarioPairJudge, ScenarioVerdict};
pub use step_analysis::{AnalysisSummary, StepAnalysis, StepAnalyzer};
pub use step_extractor::extract_steps;
pub use strategy::{
    DedupEngine, DedupStrategy, LlmStrategy, NliStrategy, Services, ThresholdStrategy,
};
