//! Version resolution
//!
//! Turns the `latest` sentinel into concrete versions. Kubernetes versions
//! come from a pluggable [`VersionResolver`]; CNI and cri-tools versions are
//! derived from the Kubernetes version when not given literally.

use semver::Version;
use std::collections::HashMap;
use thiserror::Error;

use crate::config::defaults;
use crate::core::channel::Channel;

/// Errors from looking up or interpreting versions
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    /// The resolver has no answer for this channel
    #[error("No version available for channel '{channel}'")]
    Unavailable { channel: String },

    /// The version source could not be reached
    #[error("Failed to fetch '{url}': {error}")]
    Fetch { url: String, error: String },

    /// The resolved string is not a version
    #[error("Invalid version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    /// The version is older than anything we package
    #[error("Version {version} is older than the minimum supported {minimum}")]
    Unsupported { version: String, minimum: String },
}

/// Source of the newest Kubernetes version on a channel
#[allow(async_fn_in_trait)]
pub trait VersionResolver {
    /// Newest Kubernetes version published on `channel`, without a `v` prefix
    async fn resolve(&self, channel: Channel) -> Result<String, ResolveError>;
}

/// Resolver answering from a fixed table
///
/// Used for offline runs and in tests.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    versions: HashMap<Channel, String>,
}

impl StaticResolver {
    /// Create an empty resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `version` for `channel`
    #[must_use]
    pub fn with(mut self, channel: Channel, version: impl Into<String>) -> Self {
        self.versions.insert(channel, version.into());
        self
    }
}

impl VersionResolver for StaticResolver {
    async fn resolve(&self, channel: Channel) -> Result<String, ResolveError> {
        self.versions
            .get(&channel)
            .map(|v| normalize(v))
            .ok_or_else(|| ResolveError::Unavailable {
                channel: channel.to_string(),
            })
    }
}

/// Whether a requested version asks for resolution
pub fn is_latest(version: &str) -> bool {
    let version = version.trim();
    version.is_empty() || version.eq_ignore_ascii_case(defaults::LATEST)
}

/// Trim whitespace and a leading `v`
pub fn normalize(version: &str) -> String {
    let version = version.trim();
    version.strip_prefix('v').unwrap_or(version).to_string()
}

/// Parse a version, tolerating a leading `v`
pub fn parse(version: &str) -> Result<Version, ResolveError> {
    let normalized = normalize(version);
    Version::parse(&normalized).map_err(|e| ResolveError::InvalidVersion {
        version: version.to_string(),
        reason: e.to_string(),
    })
}

/// Parse a Kubernetes version and check it is one we still package
///
/// Pre-releases of the minimum version are accepted.
pub fn parse_kubernetes(version: &str) -> Result<Version, ResolveError> {
    let parsed = parse(version)?;
    let minimum = parse(defaults::MINIMUM_KUBERNETES_VERSION)?;
    let release = Version::new(parsed.major, parsed.minor, parsed.patch);
    if release < minimum {
        return Err(ResolveError::Unsupported {
            version: parsed.to_string(),
            minimum: minimum.to_string(),
        });
    }
    Ok(parsed)
}

/// CNI plugins version shipped alongside a Kubernetes release
pub fn cni_for_kubernetes(kube: &Version) -> &'static str {
    if (kube.major, kube.minor) < (1, 17) {
        defaults::PRE_117_CNI_VERSION
    } else {
        defaults::CURRENT_CNI_VERSION
    }
}

/// cri-tools version matching a Kubernetes release line
pub fn cri_tools_for_kubernetes(kube: &Version) -> String {
    format!("{}.{}.0", kube.major, kube.minor)
}

/// Minimum CNI version the kubelet package should depend on
///
/// Never higher than the CNI version actually being packaged.
pub fn kubelet_cni_version(cni_version: &str) -> String {
    match (parse(cni_version), parse(defaults::MINIMUM_CNI_VERSION)) {
        (Ok(cni), Ok(minimum)) if cni < minimum => cni.to_string(),
        _ => defaults::MINIMUM_CNI_VERSION.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_resolver() {
        let resolver = StaticResolver::new().with(Channel::Stable, "v1.19.2");
        assert_eq!(resolver.resolve(Channel::Stable).await.unwrap(), "1.19.2");
        assert_eq!(
            resolver.resolve(Channel::Nightly).await.unwrap_err(),
            ResolveError::Unavailable {
                channel: "nightly".to_string()
            }
        );
    }

    #[test]
    fn test_latest_sentinel() {
        assert!(is_latest("latest"));
        assert!(is_latest("LATEST"));
        assert!(is_latest(""));
        assert!(!is_latest("1.19.0"));
    }

    #[test]
    fn test_minimum_kubernetes_version() {
        assert!(parse_kubernetes("1.13.0").is_ok());
        assert!(parse_kubernetes("v1.13.0-alpha.1").is_ok());
        assert!(matches!(
            parse_kubernetes("1.12.9"),
            Err(ResolveError::Unsupported { .. })
        ));
        assert!(matches!(
            parse_kubernetes("one.two"),
            Err(ResolveError::InvalidVersion { .. })
        ));
    }

    #[test]
    fn test_cni_follows_kubernetes_release() {
        assert_eq!(cni_for_kubernetes(&parse("1.16.4").unwrap()), "0.7.5");
        assert_eq!(cni_for_kubernetes(&parse("1.17.0").unwrap()), "0.8.7");
    }

    #[test]
    fn test_cri_tools_tracks_minor() {
        let kube = parse("1.19.2").unwrap();
        assert_eq!(cri_tools_for_kubernetes(&kube), "1.19.0");
        let kube = parse("1.20.0-alpha.1.100+abcdef").unwrap();
        assert_eq!(cri_tools_for_kubernetes(&kube), "1.20.0");
    }

    #[test]
    fn test_kubelet_cni_dependency() {
        assert_eq!(kubelet_cni_version("0.8.7"), "0.8.6");
        assert_eq!(kubelet_cni_version("0.7.5"), "0.7.5");
    }
}
