//! Embedding provider port for semantic vector generation.
//!
//! Defines the trait for embedding providers that convert text into
//! dense vector representations for cosine comparison.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;

/// A single embedding request item.
#[derive(Debug, Clone)]
pub struct EmbeddingInput {
    /// Unique client-side ID for correlation.
    pub id: String,
    /// Text to embed.
    pub text: String,
}

/// A single embedding result.
#[derive(Debug, Clone)]
pub struct EmbeddingOutput {
    /// Correlation ID matching the input.
    pub id: String,
    /// The embedding vector.
    pub vector: Vec<f32>,
}

/// Trait for embedding providers.
///
/// The same input text must always yield a vector usable for cosine
/// comparison with every other vector from the same provider.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Provider name (e.g., "openai", "hashed").
    fn name(&self) -> &'static str;

    /// Embedding dimension for this provider/model.
    fn dimension(&self) -> usize;

    /// Generate embeddings for multiple texts.
    ///
    /// Implementations handle chunking if the provider has per-request limits
    /// and must return one output per input, in input order.
    async fn embed_batch(&self, inputs: &[EmbeddingInput]) -> DomainResult<Vec<EmbeddingOutput>>;

    /// Maximum number of texts per single API call.
    fn max_batch_size(&self) -> usize;
}
