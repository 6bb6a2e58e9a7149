//! OpenAI embedding provider adapter.
//!
//! Talks to the `/v1/embeddings` endpoint of OpenAI or any compatible
//! server. Transient failures (connection errors, 429 and 5xx answers) are
//! retried with exponential backoff until `max_retry_secs` has elapsed.

use std::time::Duration;

use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::EmbeddingConfig;
use crate::domain::ports::{EmbeddingInput, EmbeddingOutput, EmbeddingProvider};

/// OpenAI embedding provider.
pub struct OpenAiEmbeddingProvider {
    config: EmbeddingConfig,
    client: reqwest::Client,
}

impl OpenAiEmbeddingProvider {
    pub fn new(config: EmbeddingConfig) -> DomainResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                DomainError::EmbeddingService(format!("failed to build HTTP client: {e}"))
            })?;
        Ok(Self { config, client })
    }

    fn api_key(&self) -> DomainResult<String> {
        self.config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                DomainError::EmbeddingService(
                    "OpenAI API key not set. Set OPENAI_API_KEY or embedding.api_key.".to_string(),
                )
            })
    }

    async fn call_embeddings_api(&self, api_key: &str, texts: &[String]) -> DomainResult<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.config.base_url.trim_end_matches('/'));
        let request_body = EmbeddingsRequest {
            model: &self.config.model,
            input: texts,
        };

        let policy = ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::from_secs(self.config.max_retry_secs)))
            .build();

        let result: EmbeddingsResponse = backoff::future::retry(policy, || async {
            let response = self
                .client
                .post(&url)
                .bearer_auth(api_key)
                .json(&request_body)
                .send()
                .await
                .map_err(|e| {
                    warn!(error = %e, "Embedding request failed, retrying");
                    backoff::Error::transient(DomainError::EmbeddingService(format!(
                        "Embedding API request failed: {e}"
                    )))
                })?;

            let status = response.status();
            if !status.is_success() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "unable to read response body".to_string());
                let err = DomainError::EmbeddingService(format!(
                    "Embedding API returned {status}: {body}"
                ));
                return if status.as_u16() == 429 || status.is_server_error() {
                    warn!(%status, "Embedding API busy, retrying");
                    Err(backoff::Error::transient(err))
                } else {
                    Err(backoff::Error::permanent(err))
                };
            }

            response.json::<EmbeddingsResponse>().await.map_err(|e| {
                backoff::Error::permanent(DomainError::EmbeddingService(format!(
                    "Failed to parse embedding response: {e}"
                )))
            })
        })
        .await?;

        // Sort by index to maintain input order
        let mut data = result.data;
        data.sort_by_key(|d| d.index);
        if data.len() != texts.len() {
            return Err(DomainError::EmbeddingService(format!(
                "Embedding API returned {} vectors for {} inputs",
                data.len(),
                texts.len()
            )));
        }
        if let Some((position, d)) = data.iter().enumerate().find(|(i, d)| d.index != *i) {
            return Err(DomainError::EmbeddingService(format!(
                "Embedding API returned index {} where {position} was expected",
                d.index
            )));
        }
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    async fn embed_batch(&self, inputs: &[EmbeddingInput]) -> DomainResult<Vec<EmbeddingOutput>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        let api_key = self.api_key()?;
        let chunk_size = self.config.max_batch_size.max(1);
        let mut all_outputs = Vec::with_capacity(inputs.len());

        for chunk in inputs.chunks(chunk_size) {
            let texts: Vec<String> = chunk.iter().map(|i| i.text.clone()).collect();
            let vectors = self.call_embeddings_api(&api_key, &texts).await?;
            debug!(count = vectors.len(), "Embedding chunk received");

            for (input, vector) in chunk.iter().zip(vectors) {
                all_outputs.push(EmbeddingOutput {
                    id: input.id.clone(),
                    vector,
                });
            }
        }

        Ok(all_outputs)
    }

    fn max_batch_size(&self) -> usize {
        self.config.max_batch_size
    }
}

// -- OpenAI API request/response types --

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}
