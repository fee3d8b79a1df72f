use std::path::Path;

use anyhow::Context;
use tracing::trace;

use crate::{
    AnalysisError, AnalysisResult,
    util::{
        DEFAULT_DEBOUNCE, DEFAULT_OVERLOAD_THRESHOLD, DEFAULT_OVERLOAD_WINDOW,
        DEFAULT_TIMEOUT_MARKER, get_debounce, get_overload_threshold, get_overload_window,
    },
};

/// Analysis parameters
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Config {
    /// Consecutive timeouts before a run counts as a failure
    #[serde(default = "default_debounce")]
    pub debounce: usize,

    #[serde(default)]
    pub overload: OverloadConfig,

    /// Latency field value that marks a missed ping
    #[serde(default = "default_timeout_marker")]
    pub timeout_marker: String,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct OverloadConfig {
    /// Number of consecutive responses averaged per evaluation
    #[serde(default = "default_overload_window")]
    pub window: usize,

    /// Mean latency at or above which a window counts as overloaded
    #[serde(default = "default_overload_threshold")]
    pub threshold: f64,

    /// Coalesce overlapping overload segments in the report
    #[serde(default)]
    pub merge: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debounce: default_debounce(),
            overload: OverloadConfig::default(),
            timeout_marker: default_timeout_marker(),
        }
    }
}

impl Default for OverloadConfig {
    fn default() -> Self {
        Self {
            window: default_overload_window(),
            threshold: default_overload_threshold(),
            merge: false,
        }
    }
}

fn default_debounce() -> usize {
    DEFAULT_DEBOUNCE
}

fn default_overload_window() -> usize {
    DEFAULT_OVERLOAD_WINDOW
}

fn default_overload_threshold() -> f64 {
    DEFAULT_OVERLOAD_THRESHOLD
}

fn default_timeout_marker() -> String {
    DEFAULT_TIMEOUT_MARKER.to_string()
}

impl Config {
    /// Overrides values with the `PING_*` environment variables, if set.
    pub fn with_env(mut self) -> Self {
        self.debounce = get_debounce(self.debounce);
        self.overload.window = get_overload_window(self.overload.window);
        self.overload.threshold = get_overload_threshold(self.overload.threshold);
        self
    }

    pub fn validate(&self) -> AnalysisResult<()> {
        if self.debounce == 0 {
            return Err(AnalysisError::InvalidConfig(
                "debounce must be at least 1".to_string(),
            ));
        }
        if self.overload.window == 0 {
            return Err(AnalysisError::InvalidConfig(
                "overload window must be at least 1".to_string(),
            ));
        }
        if !self.overload.threshold.is_finite() {
            return Err(AnalysisError::InvalidConfig(format!(
                "overload threshold must be finite, got {}",
                self.overload.threshold
            )));
        }
        if self.timeout_marker.trim().is_empty() || self.timeout_marker.contains(',') {
            return Err(AnalysisError::InvalidConfig(format!(
                "invalid timeout marker '{}'",
                self.timeout_marker
            )));
        }
        Ok(())
    }
}

/// Reads a JSON or (by `.toml` extension) TOML configuration file.
pub fn read_config_file(path: impl AsRef<Path>) -> anyhow::Result<Config> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
        _ => serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
    };

    config.validate()?;
    trace!("loaded config: {config:?}");
    Ok(config)
}
