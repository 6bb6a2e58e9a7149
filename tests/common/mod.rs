//! Common test utilities for integration tests
//!
//! Scripted stand-ins for the embedding and judgment services, so the
//! engine can be driven end to end with exact similarities and relations.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use scenario_dedup::domain::ports::{
    BatchItem, BatchJudge, EmbeddingInput, EmbeddingOutput, EmbeddingProvider, FailureKind,
    JudgmentResponse, RelationJudge, RelationJudgment,
};
use scenario_dedup::services::Services;
use scenario_dedup::{Config, DedupEngine, DomainError, DomainResult, RelationLabel, ScenarioRecord};

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn record(given: &str, when: &str, then: &str) -> ScenarioRecord {
    ScenarioRecord::new(given, when, then)
}

#[derive(Default)]
struct Axes {
    vectors: HashMap<String, Vec<f32>>,
    next: usize,
}

/// Embedder with exact, scripted cosine similarities.
///
/// Every text gets its own orthogonal axis unless a pair was scripted with
/// [`ScriptedEmbedder::pair`], in which case the second text is placed at
/// the requested cosine from the first. Identical texts share a vector.
pub struct ScriptedEmbedder {
    dimension: usize,
    axes: Mutex<Axes>,
    pub calls: AtomicUsize,
}

impl ScriptedEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            axes: Mutex::new(Axes::default()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Script `cos(a, b) = similarity`, both orthogonal to every other text.
    pub fn pair(self, a: &str, b: &str, similarity: f32) -> Self {
        {
            let mut axes = self.axes.lock().unwrap();
            let x = axes.next;
            let y = axes.next + 1;
            axes.next += 2;
            assert!(y < self.dimension, "scripted embedder out of axes");

            let mut va = vec![0.0; self.dimension];
            va[x] = 1.0;
            let mut vb = vec![0.0; self.dimension];
            vb[x] = similarity;
            vb[y] = (1.0 - similarity * similarity).max(0.0).sqrt();
            axes.vectors.insert(a.to_string(), va);
            axes.vectors.insert(b.to_string(), vb);
        }
        self
    }

    fn vector_for(&self, text: &str) -> DomainResult<Vec<f32>> {
        let mut axes = self.axes.lock().unwrap();
        if let Some(v) = axes.vectors.get(text) {
            return Ok(v.clone());
        }
        let axis = axes.next;
        if axis >= self.dimension {
            return Err(DomainError::EmbeddingService(format!(
                "scripted embedder ran out of axes at {text:?}"
            )));
        }
        axes.next += 1;
        let mut v = vec![0.0; self.dimension];
        v[axis] = 1.0;
        axes.vectors.insert(text.to_string(), v.clone());
        Ok(v)
    }
}

#[async_trait]
impl EmbeddingProvider for ScriptedEmbedder {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(&self, inputs: &[EmbeddingInput]) -> DomainResult<Vec<EmbeddingOutput>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        inputs
            .iter()
            .map(|input| {
                Ok(EmbeddingOutput {
                    id: input.id.clone(),
                    vector: self.vector_for(&input.text)?,
                })
            })
            .collect()
    }

    fn max_batch_size(&self) -> usize {
        256
    }
}

/// Embedder whose service is always down.
pub struct DownEmbedder;

#[async_trait]
impl EmbeddingProvider for DownEmbedder {
    fn name(&self) -> &'static str {
        "down"
    }

    fn dimension(&self) -> usize {
        8
    }

    async fn embed_batch(&self, _inputs: &[EmbeddingInput]) -> DomainResult<Vec<EmbeddingOutput>> {
        Err(DomainError::EmbeddingService("connection refused".to_string()))
    }

    fn max_batch_size(&self) -> usize {
        8
    }
}

/// Relation judge answering from substring rules.
///
/// A rule `(a, b, label)` fires when the pair text contains both `a` and
/// `b`. Unmatched pairs get the default label.
pub struct ScriptedRelationJudge {
    rules: Vec<(String, String, RelationLabel)>,
    default: Option<RelationLabel>,
    pub inputs: Mutex<Vec<String>>,
}

impl ScriptedRelationJudge {
    pub fn new(default: RelationLabel) -> Self {
        Self {
            rules: Vec::new(),
            default: Some(default),
            inputs: Mutex::new(Vec::new()),
        }
    }

    /// A judge whose every call fails.
    pub fn failing() -> Self {
        Self {
            rules: Vec::new(),
            default: None,
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn rule(mut self, a: &str, b: &str, label: RelationLabel) -> Self {
        self.rules.push((a.to_string(), b.to_string(), label));
        self
    }

    pub fn call_count(&self) -> usize {
        self.inputs.lock().unwrap().len()
    }
}

#[async_trait]
impl RelationJudge for ScriptedRelationJudge {
    fn name(&self) -> &'static str {
        "scripted-nli"
    }

    async fn classify(&self, pair_text: &str) -> DomainResult<RelationJudgment> {
        self.inputs.lock().unwrap().push(pair_text.to_string());
        let label = self
            .rules
            .iter()
            .find(|(a, b, _)| pair_text.contains(a.as_str()) && pair_text.contains(b.as_str()))
            .map(|(_, _, label)| *label)
            .or(self.default)
            .ok_or_else(|| DomainError::RelationService("503 Service Unavailable".to_string()))?;
        Ok(RelationJudgment {
            label,
            confidence: 0.95,
        })
    }
}

type Responder = dyn Fn(&[BatchItem]) -> JudgmentResponse + Send + Sync;

/// Batch judge driven by a closure over the batch it receives.
pub struct ScriptedBatchJudge {
    respond: Box<Responder>,
    pub batches: Mutex<Vec<Vec<usize>>>,
}

impl ScriptedBatchJudge {
    pub fn new(respond: impl Fn(&[BatchItem]) -> JudgmentResponse + Send + Sync + 'static) -> Self {
        Self {
            respond: Box::new(respond),
            batches: Mutex::new(Vec::new()),
        }
    }

    /// Always fails with a transport error.
    pub fn down() -> Self {
        Self::new(|_| JudgmentResponse::failure(FailureKind::Transport, "HTTP 503"))
    }

    /// Keeps everything.
    pub fn keep_all() -> Self {
        Self::new(|batch| {
            JudgmentResponse::Parsed(serde_json::json!({
                "features": batch,
                "removed": [],
            }))
        })
    }
}

#[async_trait]
impl BatchJudge for ScriptedBatchJudge {
    fn name(&self) -> &'static str {
        "scripted-batch"
    }

    async fn judge_batch(&self, batch: &[BatchItem]) -> JudgmentResponse {
        self.batches
            .lock()
            .unwrap()
            .push(batch.iter().map(|item| item.id).collect());
        (self.respond)(batch)
    }
}

pub fn engine(
    config: Config,
    embedder: Arc<dyn EmbeddingProvider>,
    relation: Arc<dyn RelationJudge>,
    batch: Arc<dyn BatchJudge>,
) -> DedupEngine {
    DedupEngine::new(
        config,
        Services {
            embedder,
            relation,
            batch,
        },
    )
}
