//! Ports (trait boundaries) to external collaborators.

pub mod batch_judge;
pub mod embedding;
pub mod relation_judge;
pub mod sink;

pub use batch_judge::{BatchItem, BatchJudge, FailureKind, JudgmentResponse};
pub use embedding::{EmbeddingInput, EmbeddingOutput, EmbeddingProvider};
pub use relation_judge::{NullRelationJudge, RelationJudge, RelationJudgment};
pub use sink::ResultSink;
