//! Supported components
//!
//! The set of packages is fixed: each maps to one template per package kind
//! and draws its version from one of the requested version inputs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which requested version a package is versioned by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSource {
    Kubernetes,
    Cni,
    CriTools,
}

/// Cluster component that can be packaged
///
/// Declared in name order so the derived ordering matches sorting by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Package {
    CriTools,
    Kubeadm,
    Kubectl,
    Kubelet,
    KubernetesCni,
}

impl Package {
    /// All packages, sorted by name
    pub const ALL: [Self; 5] = [
        Self::CriTools,
        Self::Kubeadm,
        Self::Kubectl,
        Self::Kubelet,
        Self::KubernetesCni,
    ];

    /// Package name as it appears in the repository
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CriTools => "cri-tools",
            Self::Kubeadm => "kubeadm",
            Self::Kubectl => "kubectl",
            Self::Kubelet => "kubelet",
            Self::KubernetesCni => "kubernetes-cni",
        }
    }

    /// Which version input this package's version comes from
    pub fn version_source(self) -> VersionSource {
        match self {
            Self::KubernetesCni => VersionSource::Cni,
            Self::CriTools => VersionSource::CriTools,
            Self::Kubeadm | Self::Kubectl | Self::Kubelet => VersionSource::Kubernetes,
        }
    }

    /// Comma separated list of supported names
    pub fn supported() -> String {
        Self::ALL
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Package {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == name)
            .ok_or(name)
    }
}
