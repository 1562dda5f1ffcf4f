//! Package kinds and target architectures
//!
//! A [`PackageKind`] picks the template set, the architecture naming scheme
//! and the builder. An [`ArchitectureSet`] is the second dimension of a walk;
//! it is applied uniformly to every build spec in a plan.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Native package format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
    /// Debian family (`.deb`)
    Deb,
    /// RPM family (`.rpm`)
    Rpm,
}

impl PackageKind {
    /// All supported kinds
    pub const ALL: [Self; 2] = [Self::Deb, Self::Rpm];

    /// Name used for the template subdirectory and output paths
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deb => "deb",
            Self::Rpm => "rpm",
        }
    }

    /// File extension of the produced artifacts
    pub fn artifact_extension(self) -> &'static str {
        match self {
            Self::Deb => "deb",
            Self::Rpm => "rpm",
        }
    }

    /// Turn an upstream version into one the package manager orders correctly
    ///
    /// Pre-release separators become `~` so that `1.18.0~alpha.1` sorts before
    /// `1.18.0` in both dpkg and rpm.
    pub fn package_version(self, version: &str) -> String {
        match self {
            Self::Deb | Self::Rpm => version.replacen('-', "~", 1),
        }
    }
}

impl fmt::Display for PackageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "deb" | "debs" | "debian" => Ok(Self::Deb),
            "rpm" | "rpms" => Ok(Self::Rpm),
            other => Err(format!("unknown package kind '{other}': must be one of deb, rpm")),
        }
    }
}

/// Target CPU architecture
///
/// Stored under its Go/Kubernetes name; [`Architecture::name_for`] gives the
/// spelling each package manager expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Architecture {
    Amd64,
    Arm,
    Arm64,
    Ppc64le,
    S390x,
}

impl Architecture {
    /// All supported architectures, in default build order
    pub const ALL: [Self; 5] = [
        Self::Amd64,
        Self::Arm,
        Self::Arm64,
        Self::Ppc64le,
        Self::S390x,
    ];

    /// Go/Kubernetes name, used in download links and output paths
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Amd64 => "amd64",
            Self::Arm => "arm",
            Self::Arm64 => "arm64",
            Self::Ppc64le => "ppc64le",
            Self::S390x => "s390x",
        }
    }

    /// Architecture name as the given package manager spells it
    pub fn name_for(self, kind: PackageKind) -> &'static str {
        match kind {
            PackageKind::Deb => match self {
                Self::Amd64 => "amd64",
                Self::Arm => "armhf",
                Self::Arm64 => "arm64",
                Self::Ppc64le => "ppc64el",
                Self::S390x => "s390x",
            },
            PackageKind::Rpm => match self {
                Self::Amd64 => "x86_64",
                Self::Arm => "armhfp",
                Self::Arm64 => "aarch64",
                Self::Ppc64le => "ppc64le",
                Self::S390x => "s390x",
            },
        }
    }

    fn supported() -> String {
        Self::ALL
            .iter()
            .map(|a| a.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Architecture {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "amd64" | "x86_64" => Ok(Self::Amd64),
            "arm" | "armhf" | "armhfp" | "armv7" => Ok(Self::Arm),
            "arm64" | "aarch64" => Ok(Self::Arm64),
            "ppc64le" | "ppc64el" => Ok(Self::Ppc64le),
            "s390x" => Ok(Self::S390x),
            other => Err(format!(
                "unknown architecture '{other}': must be one of {}",
                Self::supported()
            )),
        }
    }
}

impl TryFrom<String> for Architecture {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Ordered set of target architectures
///
/// Keeps the caller's order and drops repeats, so walks are reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArchitectureSet(Vec<Architecture>);

impl ArchitectureSet {
    /// Build a set from architectures in the order given
    pub fn new(architectures: impl IntoIterator<Item = Architecture>) -> Self {
        let mut set = Self::default();
        for arch in architectures {
            set.insert(arch);
        }
        set
    }

    /// Parse a list of architecture names
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self, String> {
        names
            .iter()
            .map(|name| name.as_ref().parse::<Architecture>())
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }

    /// Add an architecture; returns false if it was already present
    pub fn insert(&mut self, arch: Architecture) -> bool {
        if self.0.contains(&arch) {
            return false;
        }
        self.0.push(arch);
        true
    }

    /// Iterate architectures in walk order
    pub fn iter(&self) -> impl Iterator<Item = Architecture> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, arch: Architecture) -> bool {
        self.0.contains(&arch)
    }
}

impl FromIterator<Architecture> for ArchitectureSet {
    fn from_iter<I: IntoIterator<Item = Architecture>>(iter: I) -> Self {
        Self::new(iter)
    }
}
