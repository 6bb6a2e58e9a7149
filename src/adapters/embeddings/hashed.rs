//! Offline bag-of-words embedding provider.
//!
//! Each lowercase alphanumeric token is hashed (FNV-1a) into one of
//! `dimension` buckets and the count vector is L2-normalized. Identical
//! texts get identical vectors and texts sharing no token are orthogonal,
//! which is enough for dry runs and tests without network access.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::ports::{EmbeddingInput, EmbeddingOutput, EmbeddingProvider};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

pub struct HashedEmbeddingProvider {
    dimension: usize,
}

impl HashedEmbeddingProvider {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dimension];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let bucket = (fnv1a(&token.to_lowercase()) % self.dimension as u64) as usize;
            vector[bucket] += 1.0;
        }

        let magnitude = vector
            .iter()
            .map(|x| f64::from(*x).powi(2))
            .sum::<f64>()
            .sqrt();
        if magnitude > 0.0 {
            for value in &mut vector {
                *value = (f64::from(*value) / magnitude) as f32;
            }
        }
        vector
    }
}

fn fnv1a(text: &str) -> u64 {
    text.bytes().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

#[async_trait]
impl EmbeddingProvider for HashedEmbeddingProvider {
    fn name(&self) -> &'static str {
        "hashed"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(&self, inputs: &[EmbeddingInput]) -> DomainResult<Vec<EmbeddingOutput>> {
        Ok(inputs
            .iter()
            .map(|input| EmbeddingOutput {
                id: input.id.clone(),
                vector: self.embed_text(&input.text),
            })
            .collect())
    }

    fn max_batch_size(&self) -> usize {
        usize::MAX
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cosine_similarity;

    #[test]
    fn test_deterministic_and_case_insensitive() {
        let provider = HashedEmbeddingProvider::new(128);
        assert_eq!(
            provider.embed_text("Form is SAVED"),
            provider.embed_text("form is saved")
        );
    }

    #[test]
    fn test_similarity_tracks_token_overlap() {
        let provider = HashedEmbeddingProvider::new(512);
        let a = provider.embed_text("user clicks submit");
        let b = provider.embed_text("user clicks cancel");
        let c = provider.embed_text("admin exports reports");
        assert!(cosine_similarity(&a, &b) > cosine_similarity(&a, &c));
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let provider = HashedEmbeddingProvider::new(8);
        assert!(provider.embed_text("  ").iter().all(|v| *v == 0.0));
    }
}
