//! Release channels
//!
//! A channel is a release track. It decides which release marker names the
//! "latest" Kubernetes version and where the binaries are downloaded from.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::urls;

/// Release track a package is built for
///
/// Ordered by stability: `stable < unstable < nightly`. Build plans sort
/// channels in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Latest stable release
    Stable,
    /// Latest release including pre-releases
    Unstable,
    /// Latest CI build
    Nightly,
}

impl Channel {
    /// All channels in stability order
    pub const ALL: [Self; 3] = [Self::Stable, Self::Unstable, Self::Nightly];

    /// Canonical channel name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Unstable => "unstable",
            Self::Nightly => "nightly",
        }
    }

    /// Release marker naming the newest version on this channel
    ///
    /// Relative to the release bucket, without the `.txt` extension.
    pub fn release_marker(self) -> &'static str {
        match self {
            Self::Stable => "release/stable",
            Self::Unstable => "release/latest",
            Self::Nightly => "ci/latest",
        }
    }

    /// Base URL the component binaries for `version` are fetched from
    pub fn download_link_base(self, version: &str) -> String {
        match self {
            Self::Stable | Self::Unstable => format!("{}/v{version}", urls::KUBERNETES_RELEASE),
            Self::Nightly => format!("{}/ci/v{version}", urls::KUBERNETES_RELEASE),
        }
    }

    /// Comma separated list of canonical names
    pub fn supported() -> String {
        Self::ALL
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stable" | "release" => Ok(Self::Stable),
            "unstable" | "testing" => Ok(Self::Unstable),
            "nightly" | "ci" => Ok(Self::Nightly),
            other => Err(other.to_string()),
        }
    }
}
