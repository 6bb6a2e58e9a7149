//! Implementation of the `scenario-dedup config` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the merged configuration with secrets redacted
    Show,

    /// Load and validate the configuration without running anything
    Validate,
}

const REDACTED: &str = "<redacted>";

fn redact(mut config: Config) -> Config {
    for key in [
        &mut config.embedding.api_key,
        &mut config.nli.api_key,
        &mut config.judge.api_key,
    ] {
        if key.is_some() {
            *key = Some(REDACTED.to_string());
        }
    }
    config
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct ShowOutput(Config);

impl CommandOutput for ShowOutput {
    fn to_human(&self) -> String {
        serde_yaml::to_string(&self.0).unwrap_or_else(|e| format!("<unprintable config: {e}>"))
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.0).unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
pub struct ValidateOutput {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    pub strategy: String,
}

impl CommandOutput for ValidateOutput {
    fn to_human(&self) -> String {
        let source = self
            .config_file
            .as_ref()
            .map_or_else(|| "defaults and project files".to_string(), |p| p.display().to_string());
        format!("Configuration is valid ({source}); default strategy: {}", self.strategy)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub fn execute(args: ConfigArgs, config_file: Option<&Path>, json_mode: bool) -> Result<()> {
    let config = ConfigLoader::load_with(config_file).context("Configuration is invalid")?;
    match args.command {
        ConfigCommands::Show => output(&ShowOutput(redact(config)), json_mode),
        ConfigCommands::Validate => output(
            &ValidateOutput {
                valid: true,
                config_file: config_file.map(Path::to_path_buf),
                strategy: config.strategy.to_string(),
            },
            json_mode,
        ),
    }
    Ok(())
}
