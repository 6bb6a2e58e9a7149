use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Project configuration directory.
pub const CONFIG_DIR: &str = ".scenario-dedup";

/// Prefix for environment overrides, e.g. `SCENARIO_DEDUP_POLICY__LOW_THRESHOLD`.
pub const ENV_PREFIX: &str = "SCENARIO_DEDUP_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {name}: {value}. Must be between -1.0 and 1.0")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("Invalid batch_size: {0}. Must be at least 1")]
    InvalidBatchSize(usize),

    #[error("Invalid {name}: {value}. Must be at least 1")]
    InvalidConcurrency { name: &'static str, value: usize },

    #[error("Invalid {name}: {value}. Must be positive")]
    InvalidTimeout { name: &'static str, value: u64 },

    #[error("Contrast pair {0} has an empty term")]
    EmptyContrastTerm(usize),

    #[error("Invalid embedding dimension: {0}. Must be at least 1")]
    InvalidDimension(usize),

    #[error("Invalid judge temperature: {0}. Must be between 0.0 and 1.0")]
    InvalidTemperature(f32),

    #[error("Invalid requests_per_second: {0}. Must be at least 1")]
    InvalidRateLimit(u32),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .scenario-dedup/config.yaml (project config)
    /// 3. .scenario-dedup/local.yaml (local overrides, optional)
    /// 4. Environment variables (SCENARIO_DEDUP_* prefix, `__` separates sections)
    pub fn load() -> Result<Config> {
        Self::load_with(None)
    }

    /// Same as [`ConfigLoader::load`], with an explicit file merged above the
    /// project files and below the environment.
    pub fn load_with(explicit: Option<&Path>) -> Result<Config> {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(Path::new(CONFIG_DIR).join("config.yaml")))
            .merge(Yaml::file(Path::new(CONFIG_DIR).join("local.yaml")));

        if let Some(path) = explicit {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            figment = figment.merge(Yaml::file(path));
        }

        let config: Config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let thresholds = [
            ("policy.low_threshold", config.policy.low_threshold),
            ("policy.relation_gate", config.policy.relation_gate),
            ("threshold.threshold", config.threshold.threshold),
        ];
        for (name, value) in thresholds {
            if !(-1.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidThreshold { name, value });
            }
        }

        if config.batch.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize(0));
        }

        let concurrency = [
            ("batch.max_concurrency", config.batch.max_concurrency),
            ("relation.max_concurrency", config.relation.max_concurrency),
        ];
        for (name, value) in concurrency {
            if value == 0 {
                return Err(ConfigError::InvalidConcurrency { name, value });
            }
        }

        let timeouts = [
            ("batch.timeout_secs", config.batch.timeout_secs),
            ("relation.timeout_secs", config.relation.timeout_secs),
            ("embedding.timeout_secs", config.embedding.timeout_secs),
        ];
        for (name, value) in timeouts {
            if value == 0 {
                return Err(ConfigError::InvalidTimeout { name, value });
            }
        }

        if let Some(position) = config
            .contrast
            .pairs
            .iter()
            .position(|(a, b)| a.trim().is_empty() || b.trim().is_empty())
        {
            return Err(ConfigError::EmptyContrastTerm(position));
        }

        if config.embedding.dimension == 0 {
            return Err(ConfigError::InvalidDimension(0));
        }

        if !(0.0..=1.0).contains(&config.judge.temperature) {
            return Err(ConfigError::InvalidTemperature(config.judge.temperature));
        }

        if config.judge.requests_per_second == 0 || config.nli.requests_per_second == 0 {
            return Err(ConfigError::InvalidRateLimit(0));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::config::{EmbeddingProviderKind, StrategyKind};
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        ConfigLoader::validate(&Config::default()).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
strategy: nli
policy:
  low_threshold: 0.85
  contrast_veto: false
batch:
  batch_size: 20
  max_concurrency: 4
embedding:
  provider: hashed
  dimension: 256
logging:
  level: debug
  format: json
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.strategy, StrategyKind::Nli);
        assert!((config.policy.low_threshold - 0.85).abs() < f64::EPSILON);
        assert!(!config.policy.contrast_veto);
        assert!((config.policy.relation_gate - 0.6).abs() < f64::EPSILON);
        assert_eq!(config.batch.batch_size, 20);
        assert_eq!(config.embedding.provider, EmbeddingProviderKind::Hashed);
        assert_eq!(config.logging.format, "json");

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "threshold:\n  threshold: 0.95\nbatch:\n  batch_size: 10").unwrap();

        let config = ConfigLoader::load_from_file(file.path()).unwrap();
        assert!((config.threshold.threshold - 0.95).abs() < f64::EPSILON);
        assert_eq!(config.batch.batch_size, 10);
        assert_eq!(config.batch.max_concurrency, 1);
    }

    #[test]
    fn test_load_from_file_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "batch:\n  batch_size: 0").unwrap();
        assert!(ConfigLoader::load_from_file(file.path()).is_err());
    }

    #[test]
    fn test_env_overrides_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "policy:\n  low_threshold: 0.7").unwrap();

        temp_env::with_vars(
            [
                ("SCENARIO_DEDUP_POLICY__LOW_THRESHOLD", Some("0.9")),
                ("SCENARIO_DEDUP_STRATEGY", Some("llm")),
            ],
            || {
                let config = ConfigLoader::load_with(Some(file.path())).unwrap();
                assert!((config.policy.low_threshold - 0.9).abs() < f64::EPSILON);
                assert_eq!(config.strategy, StrategyKind::Llm);
            },
        );
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = ConfigLoader::load_with(Some(Path::new("/nonexistent/dedup.yaml"))).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_validate_threshold_range() {
        let mut config = Config::default();
        config.policy.low_threshold = 1.5;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidThreshold { name: "policy.low_threshold", .. })
        ));
    }

    #[test]
    fn test_validate_zero_concurrency() {
        let mut config = Config::default();
        config.batch.max_concurrency = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidConcurrency { .. })
        ));
    }

    #[test]
    fn test_validate_empty_contrast_term() {
        let mut config = Config::default();
        config.contrast.pairs.push(("open".to_string(), " ".to_string()));
        let last = config.contrast.pairs.len() - 1;
        match ConfigLoader::validate(&config) {
            Err(ConfigError::EmptyContrastTerm(position)) => assert_eq!(position, last),
            other => panic!("Expected EmptyContrastTerm, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();

        match ConfigLoader::validate(&config) {
            Err(ConfigError::InvalidLogLevel(level)) => assert_eq!(level, "invalid"),
            other => panic!("Expected InvalidLogLevel error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogFormat(_))
        ));
    }
}
