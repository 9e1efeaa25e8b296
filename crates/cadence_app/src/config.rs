//! Cadence configuration file handling
//!
//! Hosts may ship a `cadence.toml` next to their assets to retune the
//! classifier thresholds, the per-tier settings table and the
//! re-classification debounce. Every section is optional:
//!
//! ```toml
//! [classifier]
//! mobile_max_width = 768.0
//! low_memory_gib = 4.0
//!
//! [tiers.mobile]
//! duration = 0.8
//! ease = "power2.out"
//! stagger_multiplier = 0.6
//! parallax_intensity = 0.3
//! scrub_value = 0.5
//! scale_effect = 0.1
//! travel_distance = 20.0
//!
//! [watcher]
//! resize_debounce_ms = 150
//! orientation_debounce_ms = 500
//! ```

use std::fs;
use std::path::Path;

use anyhow::Context;
use cadence_animation::{MotionError, SettingsTable};
use cadence_platform::{Classifier, ClassifierConfig, PlatformError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::watcher::WatcherConfig;

/// Conventional configuration file name
pub const CONFIG_FILE: &str = "cadence.toml";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid classifier section: {0}")]
    Classifier(#[from] PlatformError),

    #[error("Invalid tiers section: {0}")]
    Tiers(#[from] MotionError),
}

/// Workspace configuration stored in `cadence.toml`
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CadenceConfig {
    pub classifier: ClassifierConfig,
    pub tiers: SettingsTable,
    pub watcher: WatcherConfig,
}

impl CadenceConfig {
    /// Parse and validate a configuration document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: CadenceConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check thresholds, patterns and the tier table ordering
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.build_classifier()?;
        self.tiers.validate()?;
        Ok(())
    }

    /// Compile the classifier described by the `[classifier]` section
    pub fn build_classifier(&self) -> Result<Classifier, ConfigError> {
        Ok(Classifier::new(self.classifier.clone())?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Load configuration from a file
pub fn load_config_file(path: &Path) -> anyhow::Result<CadenceConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config = CadenceConfig::from_toml_str(&content)
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded configuration");
    Ok(config)
}

/// Load `cadence.toml` from a directory, falling back to defaults when absent
pub fn load_config_or_default(dir: &Path) -> anyhow::Result<CadenceConfig> {
    let path = dir.join(CONFIG_FILE);
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no configuration file; using defaults");
        return Ok(CadenceConfig::default());
    }
    load_config_file(&path)
}
