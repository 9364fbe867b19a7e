//! # Configuration
//!
//! `BackupConfig` carries the installation-level settings a backup run
//! needs: where the site lives, how long one request may spend archiving,
//! and which table prefixes the dump rewriter works with.
//!
//! Loaded from a YAML file; every field is optional and falls back to
//! [`BackupConfig::default`]. Command-line flags override file values.
//!
//! ```yaml
//! root_path: /var/www/html
//! time_budget_seconds: 25
//! encoded_paths: true
//! base_prefix: wp_
//! intermediate_prefix: LIVE_
//! compression: deflated
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::prefix::TablePrefix;

/// Base prefix assumed when none is configured.
pub const DEFAULT_BASE_PREFIX: &str = "wp_";

/// How archive entries are stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// No compression; entry bytes are copied verbatim.
    Stored,
    /// Deflate compression.
    #[default]
    Deflated,
}

/// Settings for one backup run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackupConfig {
    /// Site root that requested file paths are relative to.
    pub root_path: Option<PathBuf>,
    /// Soft wall-clock budget per archive run. `0` means unbounded.
    pub time_budget_seconds: f64,
    /// Whether requested paths arrive base64-wrapped.
    pub encoded_paths: bool,
    /// Installation table prefix.
    pub base_prefix: TablePrefix,
    /// Placeholder prefix used in portable dumps. Empty = identity mode.
    pub intermediate_prefix: TablePrefix,
    /// Archive entry compression.
    pub compression: Compression,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            root_path: None,
            time_budget_seconds: 0.0,
            encoded_paths: false,
            base_prefix: TablePrefix(DEFAULT_BASE_PREFIX.to_string()),
            intermediate_prefix: TablePrefix::default(),
            compression: Compression::default(),
        }
    }
}

impl BackupConfig {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        tracing::debug!(path = %path.display(), "loaded backup configuration");
        Ok(config)
    }

    /// Parse and validate configuration from YAML text.
    ///
    /// An empty document yields the defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(yaml).map_err(|source| ConfigError::Parse {
                path: PathBuf::new(),
                source,
            })?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.time_budget_seconds.is_finite() || self.time_budget_seconds < 0.0 {
            return Err(ConfigError::InvalidField {
                field: "time_budget_seconds",
                reason: format!(
                    "must be a non-negative number, got {}",
                    self.time_budget_seconds
                ),
            });
        }
        if self.base_prefix.is_empty() {
            return Err(ConfigError::InvalidField {
                field: "base_prefix",
                reason: "must not be empty".into(),
            });
        }
        if !self.intermediate_prefix.is_empty() && self.intermediate_prefix == self.base_prefix {
            return Err(ConfigError::InvalidField {
                field: "intermediate_prefix",
                reason: format!(
                    "must differ from base_prefix {:?}",
                    self.base_prefix.as_str()
                ),
            });
        }
        Ok(())
    }
}
