//! Relation judge backed by a hosted NLI model (HuggingFace inference API).
//!
//! The endpoint answers with label scores, either as `[{label, score}, ..]`
//! or nested one level deeper for batched inputs. The highest-scoring
//! label wins.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{NliConfig, RelationLabel};
use crate::domain::ports::{RelationJudge, RelationJudgment};

pub struct HuggingFaceNliJudge {
    config: NliConfig,
    client: Client,
    limiter: DefaultDirectRateLimiter,
}

impl HuggingFaceNliJudge {
    pub fn new(config: NliConfig, timeout: Duration, requests_per_second: u32) -> DomainResult<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            DomainError::InvalidInput(format!("Failed to create HTTP client: {e}"))
        })?;
        let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        Ok(Self {
            config,
            client,
            limiter: RateLimiter::direct(Quota::per_second(rps)),
        })
    }

    fn api_key(&self) -> Option<String> {
        self.config
            .api_key
            .clone()
            .or_else(|| std::env::var("HF_API_TOKEN").ok())
    }
}

#[async_trait]
impl RelationJudge for HuggingFaceNliJudge {
    fn name(&self) -> &'static str {
        "huggingface"
    }

    async fn classify(&self, pair_text: &str) -> DomainResult<RelationJudgment> {
        self.limiter.until_ready().await;

        let url = format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );
        let mut request = self.client.post(&url).json(&NliRequest { inputs: pair_text });
        if let Some(key) = self.api_key() {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DomainError::RelationService(format!("NLI request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::RelationService(format!(
                "NLI endpoint returned {status}: {body}"
            )));
        }

        let body: NliResponse = response.json().await.map_err(|e| {
            DomainError::RelationService(format!("Failed to parse NLI response: {e}"))
        })?;
        pick_label(body.into_scores())
    }
}

fn pick_label(scores: Vec<LabelScore>) -> DomainResult<RelationJudgment> {
    let best = scores
        .into_iter()
        .filter(|s| s.score.is_finite())
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .ok_or_else(|| DomainError::RelationService("NLI response had no scores".to_string()))?;
    let label: RelationLabel = best.label.parse().map_err(|_| {
        DomainError::RelationService(format!("unknown NLI label `{}`", best.label))
    })?;
    Ok(RelationJudgment {
        label,
        confidence: best.score,
    })
}

#[derive(Debug, Serialize)]
struct NliRequest<'a> {
    inputs: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NliResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

impl NliResponse {
    fn into_scores(self) -> Vec<LabelScore> {
        match self {
            Self::Nested(rows) => rows.into_iter().next().unwrap_or_default(),
            Self::Flat(scores) => scores,
        }
    }
}
