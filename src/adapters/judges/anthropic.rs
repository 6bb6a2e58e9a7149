//! Batch judge backed by the Anthropic Messages API.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::JudgeConfig;
use crate::domain::ports::{BatchItem, BatchJudge, FailureKind, JudgmentResponse};

const SYSTEM_PROMPT: &str = "You are a software quality analyst reviewing BDD \
(Behavior Driven Development) scenarios for duplicates. Return only valid JSON, \
no commentary.";

/// Instruction block sent ahead of every batch.
const RULES: &str = r#"Identify and remove scenarios that are semantically duplicate of another scenario in this list.

IMPORTANT RULES:
1. Consider scenarios duplicates if they describe the SAME behavior or requirement, even if worded differently
2. DO NOT remove scenarios that test opposite outcomes (e.g., success vs. error cases)
3. DO NOT remove scenarios that test different user roles or permissions
4. DO NOT remove scenarios that test different input variations (valid vs. invalid)
5. PRESERVE edge cases and boundary conditions
6. Keep scenarios that test the same feature but with different preconditions

For each scenario decide KEEP or REMOVE. Echo every scenario's "id" unchanged.
When removing, give a short reason naming the id of the scenario it duplicates
and set "duplicate_of" to that id.

Output JSON format:
{
  "features": [
    {"id": 0, "given": "...", "when": "...", "then": "...", "action": "keep"}
  ],
  "removed": [
    {"id": 3, "given": "...", "when": "...", "then": "...", "duplicate_of": 0,
     "reason": "Duplicate of scenario 0 - same behavior"}
  ]
}"#;

pub struct AnthropicBatchJudge {
    config: JudgeConfig,
    client: Client,
    limiter: DefaultDirectRateLimiter,
}

impl AnthropicBatchJudge {
    pub fn new(config: JudgeConfig, timeout: Duration) -> DomainResult<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            DomainError::InvalidInput(format!("Failed to create HTTP client: {e}"))
        })?;
        let rps = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
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
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
    }

    /// The user prompt for one batch.
    pub fn build_prompt(batch: &[BatchItem]) -> DomainResult<String> {
        let scenarios = serde_json::to_string_pretty(batch)?;
        Ok(format!(
            "{RULES}\n\nInput JSON with {} scenarios:\n{scenarios}",
            batch.len()
        ))
    }

    fn build_request(&self, prompt: String) -> MessagesRequest<'_> {
        MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            system: SYSTEM_PROMPT,
            temperature: self.config.temperature,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        }
    }
}

#[async_trait]
impl BatchJudge for AnthropicBatchJudge {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn judge_batch(&self, batch: &[BatchItem]) -> JudgmentResponse {
        let Some(api_key) = self.api_key() else {
            return JudgmentResponse::failure(FailureKind::Transport, "ANTHROPIC_API_KEY not set");
        };
        let prompt = match Self::build_prompt(batch) {
            Ok(prompt) => prompt,
            Err(e) => return JudgmentResponse::failure(FailureKind::Transport, e.to_string()),
        };

        self.limiter.until_ready().await;
        debug!(scenarios = batch.len(), model = %self.config.model, "Sending batch for judgment");

        let response = match self
            .client
            .post(format!("{}/v1/messages", self.config.base_url.trim_end_matches('/')))
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-api-key", &api_key)
            .header("anthropic-version", &self.config.api_version)
            .json(&self.build_request(prompt))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return JudgmentResponse::failure(FailureKind::Timeout, e.to_string())
            }
            Err(e) => {
                return JudgmentResponse::failure(
                    FailureKind::Transport,
                    format!("API request failed: {e}"),
                )
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "Batch judgment request rejected");
            return JudgmentResponse::failure(
                FailureKind::Transport,
                format!("API error {status}: {body}"),
            );
        }

        let result: MessagesResponse = match response.json().await {
            Ok(result) => result,
            Err(e) => {
                return JudgmentResponse::failure(
                    FailureKind::Transport,
                    format!("Failed to parse response: {e}"),
                )
            }
        };

        // Extract text from content blocks
        let text = result
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n");

        if text.trim().is_empty() {
            JudgmentResponse::failure(FailureKind::EmptyResponse, "no text content in response")
        } else {
            JudgmentResponse::RawText(text)
        }
    }
}

// -- Messages API request/response types --

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}
