//! Engine configuration
//!
//! JSON file, every field optional:
//!
//! ```json
//! {
//!   "chart_id": "covid-cases",
//!   "terminal_stage_key": "last",
//!   "temporal_threshold": 0.6,
//!   "label_separator": " · ",
//!   "log_level": "info"
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::Severity;
use crate::predicate::{FilterEngine, DEFAULT_TEMPORAL_THRESHOLD};
use crate::sequencer::{SequencerOptions, DEFAULT_LABEL_SEPARATOR, DEFAULT_TERMINAL_KEY};

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "CHARTSTEP_CONFIG_READ",
            ConfigError::Parse(_) => "CHARTSTEP_CONFIG_PARSE",
            ConfigError::Invalid { .. } => "CHARTSTEP_CONFIG_INVALID",
        }
    }

    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            message: message.into(),
        }
    }
}

/// Engine settings shared by the CLI and embedders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Chart the specs run against (passed to adapters)
    #[serde(default)]
    pub chart_id: Option<String>,

    /// Stage key that runs last against the result store (default "last")
    #[serde(default = "default_terminal_stage_key")]
    pub terminal_stage_key: String,

    /// Share of values that must parse as dates for a field to be
    /// treated as temporal (default 0.6)
    #[serde(default = "default_temporal_threshold")]
    pub temporal_threshold: f64,

    /// Separator between terminal labels and their group (default " · ")
    #[serde(default = "default_label_separator")]
    pub label_separator: String,

    /// Minimum log severity (default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_terminal_stage_key() -> String {
    DEFAULT_TERMINAL_KEY.to_string()
}
fn default_temporal_threshold() -> f64 {
    DEFAULT_TEMPORAL_THRESHOLD
}
fn default_label_separator() -> String {
    DEFAULT_LABEL_SEPARATOR.to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chart_id: None,
            terminal_stage_key: default_terminal_stage_key(),
            temporal_threshold: default_temporal_threshold(),
            label_separator: default_label_separator(),
            log_level: default_log_level(),
        }
    }
}

impl EngineConfig {
    /// Load and validate configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let config: EngineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.terminal_stage_key.trim().is_empty() {
            return Err(ConfigError::invalid("terminal_stage_key", "must not be empty"));
        }

        if !(self.temporal_threshold > 0.0 && self.temporal_threshold <= 1.0) {
            return Err(ConfigError::invalid(
                "temporal_threshold",
                format!("{} is outside (0, 1]", self.temporal_threshold),
            ));
        }

        if self.severity().is_none() {
            return Err(ConfigError::invalid(
                "log_level",
                format!("unknown level '{}'", self.log_level),
            ));
        }

        Ok(())
    }

    /// Parsed `log_level`
    pub fn severity(&self) -> Option<Severity> {
        Severity::parse(&self.log_level)
    }

    pub fn filter_engine(&self) -> FilterEngine {
        FilterEngine::new(self.temporal_threshold)
    }

    pub fn sequencer_options(&self) -> SequencerOptions {
        SequencerOptions {
            terminal_stage_key: self.terminal_stage_key.clone(),
            label_separator: self.label_separator.clone(),
            chart_id: self.chart_id.clone(),
        }
    }
}
