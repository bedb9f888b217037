//! TOML configuration for the CLI and the HTTP server
//!
//! Every section is optional; an absent file means defaults.

use std::path::{Path, PathBuf};
use serde::Deserialize;
use thiserror::Error;
use crate::DEFAULT_RITUAL;
use crate::core::thresholds::resolve_thresholds;
use crate::types::{FeatureFlags, ThresholdOverrides, Thresholds};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
    /// Where exported evidence snapshots are written
    pub evidence_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:3000".to_string(),
            evidence_dir: PathBuf::from("./evidence"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Ritual name used in emitted event names
    pub ritual: String,
    pub thresholds: ThresholdOverrides,
    pub features: FeatureFlags,
    pub server: ServerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ritual: DEFAULT_RITUAL.to_string(),
            thresholds: ThresholdOverrides::default(),
            features: FeatureFlags::default(),
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Thresholds with the configured overrides applied
    pub fn resolved_thresholds(&self) -> Thresholds {
        resolve_thresholds(Some(&self.thresholds))
    }
}

/// Load configuration; `None` yields the defaults
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(AppConfig::default());
    };
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse_config(text: &str) -> Result<AppConfig, toml::de::Error> {
    toml::from_str(text)
}

// =============================================================================
// TESTS
// =============================================================================
