//! Judgment service adapters.

pub mod anthropic;
pub mod huggingface;

pub use anthropic::AnthropicBatchJudge;
pub use huggingface::HuggingFaceNliJudge;
