//! Configuration for perfgap-runtime.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use perfgap_core::{AnalysisOptions, Direction, DirectionTable};

/// The six standard food-system component types.
pub const STANDARD_COMPONENT_TYPES: &[&str] = &[
    "agricultural_development",
    "infrastructure",
    "nutrition_health",
    "climate_natural_resources",
    "social_protection_equity",
    "governance_institutions",
];

/// Direction table used when a config names none: every standard type is
/// higher-is-better.
pub fn standard_directions() -> DirectionTable {
    STANDARD_COMPONENT_TYPES
        .iter()
        .map(|t| (t.to_string(), Direction::HigherIsBetter))
        .collect()
}

/// Errors that can occur when loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Analysis tunables passed to the core pipeline
    #[serde(default)]
    pub analysis: AnalysisOptions,

    /// What to do with components whose gap formula is undefined
    #[serde(default)]
    pub degenerate_policy: DegeneratePolicy,

    /// Parallel fan-out configuration
    #[serde(default)]
    pub parallel: ParallelConfig,

    /// Component type → direction table. A configured table replaces the
    /// standard one entirely.
    #[serde(default = "standard_directions")]
    pub directions: DirectionTable,

    /// Determinism configuration
    #[serde(default)]
    pub determinism: DeterminismConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            analysis: AnalysisOptions::default(),
            degenerate_policy: DegeneratePolicy::default(),
            parallel: ParallelConfig::default(),
            directions: standard_directions(),
            determinism: DeterminismConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: RuntimeConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: RuntimeConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file, choosing the format by extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            Self::from_json(&contents)
        } else {
            Self::from_yaml(&contents)
        }
    }

    /// Check values serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.analysis
            .validate()
            .map_err(|e| ConfigError::ValidationError(format!("analysis: {}", e)))
    }

    /// Whether a batch of `components` should be fanned out in parallel.
    pub fn use_parallel(&self, components: usize) -> bool {
        self.parallel.enabled && components >= self.parallel.min_components
    }
}

/// Policy for components rejected with a degenerate-input error.
///
/// No policy substitutes a sentinel gap.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DegeneratePolicy {
    /// Reject the whole batch
    #[default]
    Abort,

    /// Drop the component and report it in `RuntimeResult::excluded`
    Exclude,
}

/// Parallel fan-out configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParallelConfig {
    /// Enable parallel per-component computation
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Batches smaller than this run sequentially
    #[serde(default = "default_min_components")]
    pub min_components: usize,
}

fn default_true() -> bool {
    true
}

fn default_min_components() -> usize {
    64
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_components: 64,
        }
    }
}

/// Determinism configuration for reproducible runs.
///
/// ```yaml
/// determinism:
///   analyzed_at: "2025-12-20T10:00:00Z"
/// ```
///
/// When `analyzed_at` is None (default), the current system time is used.
/// The report itself carries no timestamp and is reproducible either way.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DeterminismConfig {
    /// Fixed timestamp recorded on the runtime result
    #[serde(default)]
    pub analyzed_at: Option<DateTime<Utc>>,
}
