//! Platform-specific directory management
//!
//! Locates the configuration directory: `$XDG_CONFIG_HOME/kubepkg` on Linux,
//! `~/Library/Application Support/kubepkg` on macOS.
//!
//! `KUBEPKG_CONFIG_DIR` overrides the platform default.

use std::env;
use std::path::PathBuf;

/// Environment variable overriding the config directory
pub const ENV_CONFIG_DIR: &str = "KUBEPKG_CONFIG_DIR";

/// Application name used in directory paths
const APP_NAME: &str = "kubepkg";

/// Name of the global configuration file
const CONFIG_FILE: &str = "config.toml";

/// Directory provider for kubepkg
#[derive(Debug, Clone)]
pub struct KubepkgDirs {
    config_dir: PathBuf,
}

impl KubepkgDirs {
    /// Resolve directories from the environment, then platform defaults
    #[must_use]
    pub fn new() -> Self {
        Self {
            config_dir: Self::resolve_config_dir(),
        }
    }

    /// Use an explicit config directory
    #[must_use]
    pub fn with_config_dir(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    #[must_use]
    pub fn config_dir(&self) -> PathBuf {
        self.config_dir.clone()
    }

    /// Path to `config.toml` in the config directory
    #[must_use]
    pub fn global_config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    fn resolve_config_dir() -> PathBuf {
        match env::var(ENV_CONFIG_DIR) {
            Ok(path) if !path.is_empty() => PathBuf::from(path),
            _ => Self::platform_config_dir(),
        }
    }

    fn platform_config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .map(|h| h.join(".config").join(APP_NAME))
                    .unwrap_or_else(|| PathBuf::from(".").join(".config").join(APP_NAME))
            })
    }
}

impl Default for KubepkgDirs {
    fn default() -> Self {
        Self::new()
    }
}
