use serde::{Deserialize, Serialize};

/// Main configuration structure for scenario deduplication
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Reduction strategy used when none is given on the command line
    #[serde(default)]
    pub strategy: StrategyKind,

    /// Pairwise decision thresholds
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Whole-scenario similarity strategy
    #[serde(default)]
    pub threshold: ThresholdConfig,

    /// Contradictory keyword lexicon
    #[serde(default)]
    pub contrast: ContrastConfig,

    /// Batch judgment strategy
    #[serde(default)]
    pub batch: BatchConfig,

    /// Relation classification calls
    #[serde(default)]
    pub relation: RelationConfig,

    /// Embedding provider
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// NLI endpoint
    #[serde(default)]
    pub nli: NliConfig,

    /// Generative judgment endpoint
    #[serde(default)]
    pub judge: JudgeConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            policy: PolicyConfig::default(),
            threshold: ThresholdConfig::default(),
            contrast: ContrastConfig::default(),
            batch: BatchConfig::default(),
            relation: RelationConfig::default(),
            embedding: EmbeddingConfig::default(),
            nli: NliConfig::default(),
            judge: JudgeConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Which reduction strategy to run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Whole-scenario cosine similarity with contrast veto
    #[default]
    Threshold,
    /// Stepwise cosine similarity plus relation classification
    Nli,
    /// Batched generative judgment
    Llm,
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Threshold => write!(f, "threshold"),
            Self::Nli => write!(f, "nli"),
            Self::Llm => write!(f, "llm"),
        }
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "threshold" | "cosine" => Ok(Self::Threshold),
            "nli" => Ok(Self::Nli),
            "llm" => Ok(Self::Llm),
            other => Err(format!("unknown strategy: {other}")),
        }
    }
}

/// Thresholds for the pairwise decision policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PolicyConfig {
    /// Similarity at or below this is always distinct
    #[serde(default = "default_low_threshold")]
    pub low_threshold: f64,

    /// Relation classification only runs above this similarity
    #[serde(default = "default_relation_gate")]
    pub relation_gate: f64,

    /// Lexical contrast forbids a duplicate decision
    #[serde(default = "default_true")]
    pub contrast_veto: bool,
}

const fn default_low_threshold() -> f64 {
    0.8
}

const fn default_relation_gate() -> f64 {
    0.6
}

const fn default_true() -> bool {
    true
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            low_threshold: default_low_threshold(),
            relation_gate: default_relation_gate(),
            contrast_veto: default_true(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ThresholdConfig {
    /// Whole-scenario similarity above which a later scenario is a duplicate
    #[serde(default = "default_scenario_threshold")]
    pub threshold: f64,
}

const fn default_scenario_threshold() -> f64 {
    0.9
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            threshold: default_scenario_threshold(),
        }
    }
}

/// Symmetric contradictory term pairs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ContrastConfig {
    #[serde(default = "default_contrast_pairs")]
    pub pairs: Vec<(String, String)>,
}

fn default_contrast_pairs() -> Vec<(String, String)> {
    [
        ("success", "error"),
        ("approve", "reject"),
        ("completed", "failed"),
        ("allow", "deny"),
        ("green", "red"),
        ("enabled", "disabled"),
        ("true", "false"),
        ("valid", "invalid"),
        ("accepted", "rejected"),
        ("active", "inactive"),
        ("pass", "fail"),
        ("positive", "negative"),
        ("granted", "denied"),
        ("authenticated", "unauthorized"),
    ]
    .into_iter()
    .map(|(a, b)| (a.to_string(), b.to_string()))
    .collect()
}

impl Default for ContrastConfig {
    fn default() -> Self {
        Self {
            pairs: default_contrast_pairs(),
        }
    }
}

/// Batch judgment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BatchConfig {
    /// Scenarios per judgment call
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Concurrent judgment calls (1 = sequential)
    #[serde(default = "default_batch_concurrency")]
    pub max_concurrency: usize,

    /// Per-call timeout in seconds
    #[serde(default = "default_batch_timeout")]
    pub timeout_secs: u64,
}

const fn default_batch_size() -> usize {
    50
}

const fn default_batch_concurrency() -> usize {
    1
}

const fn default_batch_timeout() -> u64 {
    120
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_concurrency: default_batch_concurrency(),
            timeout_secs: default_batch_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RelationConfig {
    /// Per-pair classification timeout in seconds
    #[serde(default = "default_relation_timeout")]
    pub timeout_secs: u64,

    /// Concurrent classification calls during step analysis
    #[serde(default = "default_relation_concurrency")]
    pub max_concurrency: usize,
}

const fn default_relation_timeout() -> u64 {
    30
}

const fn default_relation_concurrency() -> usize {
    4
}

impl Default for RelationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_relation_timeout(),
            max_concurrency: default_relation_concurrency(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProviderKind {
    /// OpenAI-compatible `/embeddings` endpoint
    #[default]
    Openai,
    /// Offline hashed bag-of-words vectors
    Hashed,
}

/// Embedding provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EmbeddingProviderKind,

    /// API key (falls back to `OPENAI_API_KEY`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_embedding_base_url")]
    pub base_url: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Vector length
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// Maximum texts per request
    #[serde(default = "default_embedding_batch")]
    pub max_batch_size: usize,

    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,

    /// Total retry window for transient failures, in seconds
    #[serde(default = "default_embedding_retry_secs")]
    pub max_retry_secs: u64,
}

fn default_embedding_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

const fn default_embedding_dimension() -> usize {
    1536
}

const fn default_embedding_batch() -> usize {
    2048
}

const fn default_embedding_timeout() -> u64 {
    30
}

const fn default_embedding_retry_secs() -> u64 {
    60
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::default(),
            api_key: None,
            base_url: default_embedding_base_url(),
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            max_batch_size: default_embedding_batch(),
            timeout_secs: default_embedding_timeout(),
            max_retry_secs: default_embedding_retry_secs(),
        }
    }
}

/// Hosted NLI text-classification endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NliConfig {
    /// API token (falls back to `HF_API_TOKEN`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_nli_base_url")]
    pub base_url: String,

    #[serde(default = "default_nli_model")]
    pub model: String,

    /// Pair separator inserted between premise and hypothesis
    #[serde(default = "default_nli_separator")]
    pub separator: String,

    /// Client-side request rate limit
    #[serde(default = "default_nli_rps")]
    pub requests_per_second: u32,
}

fn default_nli_base_url() -> String {
    "https://api-inference.huggingface.co/models".to_string()
}

fn default_nli_model() -> String {
    "roberta-large-mnli".to_string()
}

fn default_nli_separator() -> String {
    " </s> ".to_string()
}

const fn default_nli_rps() -> u32 {
    10
}

impl Default for NliConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_nli_base_url(),
            model: default_nli_model(),
            separator: default_nli_separator(),
            requests_per_second: default_nli_rps(),
        }
    }
}

/// Generative judgment endpoint (Anthropic Messages API)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct JudgeConfig {
    /// API key (falls back to `ANTHROPIC_API_KEY`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_judge_base_url")]
    pub base_url: String,

    #[serde(default = "default_judge_model")]
    pub model: String,

    #[serde(default = "default_judge_api_version")]
    pub api_version: String,

    #[serde(default = "default_judge_max_tokens")]
    pub max_tokens: u32,

    /// Low temperature keeps decisions stable across runs
    #[serde(default = "default_judge_temperature")]
    pub temperature: f32,

    /// Client-side request rate limit
    #[serde(default = "default_judge_rps")]
    pub requests_per_second: u32,
}

fn default_judge_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_judge_model() -> String {
    "claude-sonnet-4-5".to_string()
}

fn default_judge_api_version() -> String {
    "2023-06-01".to_string()
}

const fn default_judge_max_tokens() -> u32 {
    16_384
}

const fn default_judge_temperature() -> f32 {
    0.1
}

const fn default_judge_rps() -> u32 {
    2
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_judge_base_url(),
            model: default_judge_model(),
            api_version: default_judge_api_version(),
            max_tokens: default_judge_max_tokens(),
            temperature: default_judge_temperature(),
            requests_per_second: default_judge_rps(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stderr only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}
