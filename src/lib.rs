//! Scenario Dedup - semantic deduplication of Given/When/Then scenarios
//!
//! Scenario collections generated from requirements tend to repeat the same
//! behavior in slightly different words. This crate removes semantic
//! duplicates while keeping scenarios that look alike but assert opposite
//! outcomes ("is approved" / "is rejected").
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Scenario records, decisions, results and the
//!   ports to embedding and judgment services
//! - **Service Layer** (`services`): Step extraction, similarity, contrast
//!   detection, the decision policy and the three reduction strategies
//! - **Adapters** (`adapters`): HTTP embedding and judgment clients, the
//!   offline hashed embedder and the JSON file sink
//! - **Infrastructure Layer** (`infrastructure`): Configuration and logging
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use scenario_dedup::{adapters::build_services, Config, DedupEngine, ScenarioRecord};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let engine = DedupEngine::new(config.clone(), build_services(&config)?);
//!     let records = vec![ScenarioRecord::new("user logged in", "clicks submit", "form is saved")];
//!     let outcome = engine.run(None, &records).await?;
//!     println!("kept {}", outcome.report.kept_count);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    AuditEntry, Config, Decision, DedupOutcome, DedupReport, DedupResult, LoggingConfig,
    RelationLabel, ScenarioRecord, ScenarioSet, StepRole, StepUnit, StrategyKind,
};
pub use domain::ports::{BatchJudge, EmbeddingProvider, RelationJudge, ResultSink};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{DedupEngine, DedupStrategy, Services};
