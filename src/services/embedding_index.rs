//! Embedding index with a precomputed similarity matrix.
//!
//! Every text of a run is embedded through a single batched provider call
//! and the full cosine matrix is computed once. After construction the
//! index is read-only, so lookups are O(1) and safe to share between
//! comparison workers.

use tracing::{debug, info, instrument};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::{EmbeddingInput, EmbeddingProvider};

/// Vectors for one run plus their symmetric cosine similarity matrix.
#[derive(Debug, Clone)]
pub struct EmbeddingIndex {
    vectors: Vec<Vec<f32>>,
    matrix: Vec<f64>,
    len: usize,
}

impl EmbeddingIndex {
    /// Embed `texts` in one batched call and build the similarity matrix.
    ///
    /// Any provider failure is fatal: a partially populated index is never
    /// returned since downstream logic assumes full coverage.
    #[instrument(skip_all, fields(provider = provider.name(), texts = texts.len()))]
    pub async fn build(provider: &dyn EmbeddingProvider, texts: &[String]) -> DomainResult<Self> {
        if texts.is_empty() {
            return Ok(Self::from_vectors(Vec::new()));
        }

        let inputs: Vec<EmbeddingInput> = texts
            .iter()
            .enumerate()
            .map(|(i, text)| EmbeddingInput {
                id: i.to_string(),
                text: text.clone(),
            })
            .collect();

        let outputs = provider.embed_batch(&inputs).await.map_err(|e| match e {
            DomainError::EmbeddingService(_) => e,
            other => DomainError::EmbeddingService(other.to_string()),
        })?;

        if outputs.len() != inputs.len() {
            return Err(DomainError::EmbeddingService(format!(
                "provider returned {} vectors for {} texts",
                outputs.len(),
                inputs.len()
            )));
        }

        let dimension = outputs[0].vector.len();
        let mut vectors = Vec::with_capacity(outputs.len());
        for (input, output) in inputs.iter().zip(outputs) {
            if output.id != input.id {
                return Err(DomainError::EmbeddingService(format!(
                    "provider returned vector for id {} where {} was expected",
                    output.id, input.id
                )));
            }
            if output.vector.len() != dimension || dimension == 0 {
                return Err(DomainError::EmbeddingService(format!(
                    "inconsistent vector dimension for text {}: {} (expected {})",
                    input.id,
                    output.vector.len(),
                    dimension
                )));
            }
            if output.vector.iter().any(|v| !v.is_finite()) {
                return Err(DomainError::EmbeddingService(format!(
                    "non-finite value in vector for text {}",
                    input.id
                )));
            }
            vectors.push(output.vector);
        }

        info!(count = vectors.len(), dimension, "Embeddings ready");
        Ok(Self::from_vectors(vectors))
    }

    /// Build directly from precomputed vectors.
    pub fn from_vectors(vectors: Vec<Vec<f32>>) -> Self {
        let matrix = similarity_matrix(&vectors);
        let len = vectors.len();
        debug!(len, "Similarity matrix computed");
        Self {
            vectors,
            matrix,
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn vector(&self, i: usize) -> Option<&[f32]> {
        self.vectors.get(i).map(Vec::as_slice)
    }

    /// Cosine similarity between items `i` and `j`.
    ///
    /// Panics if either index is out of range.
    pub fn similarity(&self, i: usize, j: usize) -> f64 {
        assert!(
            i < self.len && j < self.len,
            "similarity({i}, {j}) out of range for index of {}",
            self.len
        );
        self.matrix[i * self.len + j]
    }
}

/// Symmetric NxN cosine matrix, row-major. The diagonal is exactly 1.0 and
/// each off-diagonal value is computed once and mirrored.
pub fn similarity_matrix(vectors: &[Vec<f32>]) -> Vec<f64> {
    let n = vectors.len();
    let mut matrix = vec![0.0; n * n];
    for i in 0..n {
        matrix[i * n + i] = 1.0;
        for j in (i + 1)..n {
            let sim = cosine_similarity(&vectors[i], &vectors[j]);
            matrix[i * n + j] = sim;
            matrix[j * n + i] = sim;
        }
    }
    matrix
}

/// Calculate cosine similarity between two embedding vectors, clamped to [-1, 1].
///
/// Mismatched lengths and zero vectors yield 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum();
    let norm_a: f64 = a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot_product / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::EmbeddingOutput;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl EmbeddingProvider for CountingProvider {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn dimension(&self) -> usize {
            2
        }

        async fn embed_batch(
            &self,
            inputs: &[EmbeddingInput],
        ) -> DomainResult<Vec<EmbeddingOutput>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DomainError::EmbeddingService("model unavailable".into()));
            }
            Ok(inputs
                .iter()
                .map(|input| EmbeddingOutput {
                    id: input.id.clone(),
                    vector: vec![input.text.len() as f32, 1.0],
                })
                .collect())
        }

        fn max_batch_size(&self) -> usize {
            16
        }
    }

    #[test]
    fn test_cosine_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-12);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-12);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-12);
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).abs() < f64::EPSILON);
        assert!(cosine_similarity(&[1.0], &[1.0, 2.0]).abs() < f64::EPSILON);
    }

    #[test]
    fn test_matrix_symmetric_with_unit_diagonal() {
        let index = EmbeddingIndex::from_vectors(vec![
            vec![0.3, 0.7, 0.1],
            vec![0.9, 0.2, 0.4],
            vec![0.0, 0.0, 0.0],
        ]);
        for i in 0..3 {
            assert_eq!(index.similarity(i, i), 1.0);
            for j in 0..3 {
                assert_eq!(index.similarity(i, j), index.similarity(j, i));
            }
        }
    }

    #[tokio::test]
    async fn test_build_makes_one_batched_call() {
        let provider = CountingProvider {
            calls: AtomicUsize::new(0),
            fail: false,
        };
        let texts: Vec<String> = (0..10).map(|i| "x".repeat(i + 1)).collect();
        let index = EmbeddingIndex::build(&provider, &texts).await.unwrap();
        assert_eq!(index.len(), 10);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_build_failure_is_embedding_error() {
        let provider = CountingProvider {
            calls: AtomicUsize::new(0),
            fail: true,
        };
        let err = EmbeddingIndex::build(&provider, &["a".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::EmbeddingService(_)));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_build_empty_skips_provider() {
        let provider = CountingProvider {
            calls: AtomicUsize::new(0),
            fail: true,
        };
        let index = EmbeddingIndex::build(&provider, &[]).await.unwrap();
        assert!(index.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }
}
