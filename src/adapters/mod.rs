//! Adapters for external systems.

pub mod embeddings;
pub mod judges;
pub mod sinks;

use std::sync::Arc;
use std::time::Duration;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Config, EmbeddingProviderKind};
use crate::domain::ports::EmbeddingProvider;
use crate::services::Services;

use embeddings::{HashedEmbeddingProvider, OpenAiEmbeddingProvider};
use judges::{AnthropicBatchJudge, HuggingFaceNliJudge};

/// Construct every external collaborator once from configuration.
///
/// Nothing here contacts a service; credentials are only checked when a
/// call is made, so strategies that never use a judge never need its key.
pub fn build_services(config: &Config) -> DomainResult<Services> {
    let embedder: Arc<dyn EmbeddingProvider> = match config.embedding.provider {
        EmbeddingProviderKind::Openai => {
            Arc::new(OpenAiEmbeddingProvider::new(config.embedding.clone())?)
        }
        EmbeddingProviderKind::Hashed => {
            Arc::new(HashedEmbeddingProvider::new(config.embedding.dimension))
        }
    };

    let relation = Arc::new(HuggingFaceNliJudge::new(
        config.nli.clone(),
        Duration::from_secs(config.relation.timeout_secs),
        config.nli.requests_per_second,
    )?);

    let batch = Arc::new(AnthropicBatchJudge::new(
        config.judge.clone(),
        Duration::from_secs(config.batch.timeout_secs),
    )?);

    Ok(Services {
        embedder,
        relation,
        batch,
    })
}
