//! Global configuration management
//!
//! Reads optional settings from `config.toml` in the config directory. Every
//! value is optional; command line flags win over the file and the file wins
//! over built-in defaults.
//!
//! ```toml
//! [release]
//! base_url = "https://dl.k8s.io"
//!
//! [build]
//! template_dir = "templates/latest"
//! output_dir = "bin"
//! revision = "0"
//! architectures = ["amd64", "arm64"]
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::infra::dirs::KubepkgDirs;

/// Configuration file errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file '{path}': {error}")]
    ReadError { path: String, error: String },

    /// Failed to parse config file
    #[error("Failed to parse config file '{path}': {error}")]
    ParseError { path: String, error: String },
}

/// Global configuration for kubepkg
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// Release bucket settings
    #[serde(default)]
    pub release: ReleaseConfig,

    /// Default build options
    #[serde(default)]
    pub build: BuildConfig,
}

/// Release bucket settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReleaseConfig {
    /// Base URL release markers are read from
    pub base_url: Option<String>,
}

/// Default build options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Root of the template tree
    pub template_dir: Option<PathBuf>,

    /// Where work directories and packages are written
    pub output_dir: Option<PathBuf>,

    /// Package revision
    pub revision: Option<String>,

    /// Target architectures
    pub architectures: Option<Vec<String>>,
}

impl GlobalConfig {
    /// Load configuration from the config directory
    ///
    /// A missing file yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ParseError` if the file exists but is not valid
    /// TOML for this schema.
    pub fn load(dirs: &KubepkgDirs) -> Result<Self, ConfigError> {
        Self::load_from_path(&dirs.global_config_path())
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config file at {}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        tracing::debug!("Loaded config file {}", path.display());
        Self::from_toml(&content).map_err(|error| ConfigError::ParseError {
            path: path.display().to_string(),
            error,
        })
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Effective release bucket URL
    #[must_use]
    pub fn release_base_url(&self) -> &str {
        self.release
            .base_url
            .as_deref()
            .unwrap_or(crate::config::urls::KUBERNETES_RELEASE)
    }
}
