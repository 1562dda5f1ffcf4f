//! Root options shared by every build command
//!
//! [`RootOptions`] is assembled once per invocation with priority
//! CLI > config file > default, validated, and then passed by reference to
//! the command that needs it.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::{defaults, urls};
use crate::core::global_config::GlobalConfig;
use crate::core::kind::{ArchitectureSet, PackageKind};
use crate::core::plan::BuildRequest;
use crate::core::walker::WalkOptions;

/// Option validation errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum OptionsError {
    /// A list option was given no values
    #[error("At least one {what} must be given")]
    EmptyList { what: &'static str },

    /// An architecture name is not recognised
    #[error("Invalid --arch value: {reason}")]
    UnknownArchitecture { reason: String },

    /// The template directory does not exist
    #[error("Template directory '{path}' does not exist")]
    TemplateDirMissing { path: PathBuf },

    /// The revision is blank
    #[error("Revision must not be empty")]
    EmptyRevision,
}

/// Options for a build invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootOptions {
    /// Target architecture names
    pub architectures: Vec<String>,
    /// Channel names
    pub channels: Vec<String>,
    /// Package names
    pub packages: Vec<String>,
    /// Kubernetes version or `latest`
    pub kube_version: String,
    pub revision: String,
    /// CNI plugins version or `latest`
    pub cni_version: String,
    /// cri-tools version or `latest`
    pub cri_tools_version: String,
    /// Root of the template tree
    pub template_dir: PathBuf,
    /// Root of the per-pair work directories
    pub output_dir: PathBuf,
    /// Render packaging trees only
    pub spec_only: bool,
    /// Release bucket for `latest` lookups
    pub release_base_url: String,
}

impl Default for RootOptions {
    fn default() -> Self {
        fn owned(values: &[&str]) -> Vec<String> {
            values.iter().map(|v| (*v).to_string()).collect()
        }

        Self {
            architectures: owned(defaults::DEFAULT_ARCHITECTURES),
            channels: owned(defaults::DEFAULT_CHANNELS),
            packages: owned(defaults::DEFAULT_PACKAGES),
            kube_version: defaults::LATEST.to_string(),
            revision: defaults::DEFAULT_REVISION.to_string(),
            cni_version: defaults::LATEST.to_string(),
            cri_tools_version: defaults::LATEST.to_string(),
            template_dir: PathBuf::from(defaults::DEFAULT_TEMPLATE_DIR),
            output_dir: PathBuf::from(defaults::DEFAULT_OUTPUT_DIR),
            spec_only: false,
            release_base_url: urls::KUBERNETES_RELEASE.to_string(),
        }
    }
}

impl RootOptions {
    /// Defaults overlaid with whatever the config file sets
    #[must_use]
    pub fn from_config(config: &GlobalConfig) -> Self {
        let mut options = Self {
            release_base_url: config.release_base_url().to_string(),
            ..Self::default()
        };
        let build = &config.build;
        if let Some(template_dir) = &build.template_dir {
            options.template_dir.clone_from(template_dir);
        }
        if let Some(output_dir) = &build.output_dir {
            options.output_dir.clone_from(output_dir);
        }
        if let Some(revision) = &build.revision {
            options.revision.clone_from(revision);
        }
        if let Some(architectures) = &build.architectures {
            options.architectures.clone_from(architectures);
        }
        options
    }

    /// Check the options before any work starts
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.packages.is_empty() {
            return Err(OptionsError::EmptyList { what: "package" });
        }
        if self.channels.is_empty() {
            return Err(OptionsError::EmptyList { what: "channel" });
        }
        self.architecture_set()?;
        if self.revision.trim().is_empty() {
            return Err(OptionsError::EmptyRevision);
        }
        if !self.template_dir.is_dir() {
            return Err(OptionsError::TemplateDirMissing {
                path: self.template_dir.clone(),
            });
        }
        Ok(())
    }

    /// Parsed, de-duplicated target architectures
    pub fn architecture_set(&self) -> Result<ArchitectureSet, OptionsError> {
        if self.architectures.is_empty() {
            return Err(OptionsError::EmptyList {
                what: "architecture",
            });
        }
        ArchitectureSet::parse(&self.architectures)
            .map_err(|reason| OptionsError::UnknownArchitecture { reason })
    }

    /// Plan request for `kind`
    pub fn build_request(&self, kind: PackageKind) -> BuildRequest {
        BuildRequest::new(kind, self.template_dir.clone())
            .packages(self.packages.iter().cloned())
            .channels(self.channels.iter().cloned())
            .kube_version(self.kube_version.as_str())
            .revision(self.revision.as_str())
            .cni_version(self.cni_version.as_str())
            .cri_tools_version(self.cri_tools_version.as_str())
    }

    /// Walk options without progress reporting
    pub fn walk_options(&self) -> WalkOptions {
        WalkOptions::new(self.output_dir.clone()).spec_only(self.spec_only)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::global_config::BuildConfig;
    use tempfile::TempDir;

    fn valid_options(template_dir: &TempDir) -> RootOptions {
        RootOptions {
            template_dir: template_dir.path().to_path_buf(),
            ..RootOptions::default()
        }
    }

    #[test]
    fn test_defaults() {
        let options = RootOptions::default();
        assert_eq!(options.packages.len(), 5);
        assert_eq!(options.channels, vec!["stable", "unstable", "nightly"]);
        assert_eq!(options.kube_version, "latest");
        assert_eq!(options.revision, "0");
        assert_eq!(options.output_dir, PathBuf::from("bin"));
        assert!(!options.spec_only);
    }

    #[test]
    fn test_config_overrides_defaults() {
        let config = GlobalConfig {
            build: BuildConfig {
                revision: Some("3".to_string()),
                architectures: Some(vec!["arm64".to_string()]),
                ..BuildConfig::default()
            },
            ..GlobalConfig::default()
        };
        let options = RootOptions::from_config(&config);
        assert_eq!(options.revision, "3");
        assert_eq!(options.architectures, vec!["arm64"]);
        assert_eq!(options.template_dir, PathBuf::from("templates/latest"));
    }

    #[test]
    fn test_validate_accepts_defaults_with_existing_templates() {
        let dir = TempDir::new().unwrap();
        assert_eq!(valid_options(&dir).validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_empty_lists() {
        let dir = TempDir::new().unwrap();
        let mut options = valid_options(&dir);
        options.channels.clear();
        assert_eq!(
            options.validate(),
            Err(OptionsError::EmptyList { what: "channel" })
        );

        let mut options = valid_options(&dir);
        options.architectures.clear();
        assert_eq!(
            options.validate(),
            Err(OptionsError::EmptyList {
                what: "architecture"
            })
        );
    }

    #[test]
    fn test_validate_rejects_unknown_architecture() {
        let dir = TempDir::new().unwrap();
        let mut options = valid_options(&dir);
        options.architectures = vec!["amd64".to_string(), "mips".to_string()];
        let err = options.validate().unwrap_err();
        assert!(matches!(err, OptionsError::UnknownArchitecture { .. }));
        assert!(err.to_string().contains("mips"));
    }

    #[test]
    fn test_validate_rejects_missing_template_dir() {
        let dir = TempDir::new().unwrap();
        let options = RootOptions {
            template_dir: dir.path().join("missing"),
            ..RootOptions::default()
        };
        assert!(matches!(
            options.validate(),
            Err(OptionsError::TemplateDirMissing { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_blank_revision() {
        let dir = TempDir::new().unwrap();
        let mut options = valid_options(&dir);
        options.revision = "  ".to_string();
        assert_eq!(options.validate(), Err(OptionsError::EmptyRevision));
    }

    #[test]
    fn test_build_request_carries_selection() {
        let options = RootOptions {
            packages: vec!["kubelet".to_string()],
            kube_version: "1.19.2".to_string(),
            ..RootOptions::default()
        };
        let request = options.build_request(PackageKind::Rpm);
        assert_eq!(request.kind, PackageKind::Rpm);
        assert_eq!(request.packages, vec!["kubelet"]);
        assert_eq!(request.kube_version, "1.19.2");
        assert_eq!(request.template_dir, PathBuf::from("templates/latest"));
    }

    #[test]
    fn test_walk_options_follow_spec_only() {
        let options = RootOptions {
            spec_only: true,
            ..RootOptions::default()
        };
        let walk = options.walk_options();
        assert!(walk.spec_only);
        assert_eq!(walk.output_dir, PathBuf::from("bin"));
    }
}
