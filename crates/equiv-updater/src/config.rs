//! Configuration for the updater
//!
//! Loaded once at start-up and never mutated afterwards.

use crate::error::ConfigError;
use crate::handlers::EpisodeFilterMode;
use crate::presets::UpdaterPreset;
use equiv_alias::AliasExpansionConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

/// Pipeline-wide settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Subjects updated at once by the bulk runner (default: 4)
    #[serde(default = "default_max_concurrent_subjects")]
    pub max_concurrent_subjects: usize,

    /// Per-generator timeout in milliseconds; unbounded when absent
    #[serde(default)]
    pub generator_timeout_ms: Option<u64>,

    /// URIs never equivalated, as subject or candidate
    #[serde(default)]
    pub excluded_uris: Vec<String>,

    /// Ids never equivalated, as subject or candidate
    #[serde(default)]
    pub excluded_ids: Vec<u64>,
}

fn default_max_concurrent_subjects() -> usize {
    4
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_subjects: default_max_concurrent_subjects(),
            generator_timeout_ms: None,
            excluded_uris: Vec::new(),
            excluded_ids: Vec::new(),
        }
    }
}

impl PipelineConfig {
    /// Generator timeout as a [`Duration`]
    pub fn generator_timeout(&self) -> Option<Duration> {
        self.generator_timeout_ms.map(Duration::from_millis)
    }
}

/// How one publisher's content is equivalated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Publisher key of the subjects
    pub publisher: String,

    /// Preset for items, episodes and films
    #[serde(default)]
    pub item: Option<UpdaterPreset>,

    /// Preset for brands and series
    #[serde(default)]
    pub container: Option<UpdaterPreset>,

    /// Publishers candidates are drawn from
    pub targets: Vec<String>,

    /// Episode parent filtering applied to item results
    #[serde(default)]
    pub episode_filter: Option<EpisodeFilterMode>,
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EquivConfig {
    /// Pipeline settings
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Alias expansion table (default: UK broadcast groups)
    #[serde(default)]
    pub alias: AliasExpansionConfig,

    /// One entry per subject publisher
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

impl EquivConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.max_concurrent_subjects == 0 {
            return Err(ConfigError::Invalid(
                "max_concurrent_subjects must be at least 1".to_string(),
            ));
        }
        if self.pipeline.generator_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "generator_timeout_ms must be positive".to_string(),
            ));
        }

        self.alias.validate()?;

        let mut publishers = BTreeSet::new();
        for source in &self.sources {
            if source.publisher.trim().is_empty() {
                return Err(ConfigError::Invalid("source publisher is empty".to_string()));
            }
            if !publishers.insert(source.publisher.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "source {} is configured more than once",
                    source.publisher
                )));
            }
            if source.targets.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "source {} has no target publishers",
                    source.publisher
                )));
            }
            if source.item.is_none() && source.container.is_none() {
                return Err(ConfigError::Invalid(format!(
                    "source {} names no updater preset",
                    source.publisher
                )));
            }
            if let Some(preset) = source.item.filter(|p| p.for_containers()) {
                return Err(ConfigError::Invalid(format!(
                    "source {}: {} cannot equivalate items",
                    source.publisher,
                    preset.as_str()
                )));
            }
            if let Some(preset) = source.container.filter(|p| !p.for_containers()) {
                return Err(ConfigError::Invalid(format!(
                    "source {}: {} cannot equivalate containers",
                    source.publisher,
                    preset.as_str()
                )));
            }
        }

        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
