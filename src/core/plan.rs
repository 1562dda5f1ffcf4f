//! Build plan construction
//!
//! [`construct_builds`] expands (packages x channels) into fully resolved
//! [`BuildSpec`]s. Any configuration problem fails the whole construction;
//! callers never see a partial plan.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use crate::config::{defaults, urls};
use crate::core::channel::Channel;
use crate::core::kind::{Architecture, PackageKind};
use crate::core::package::{Package, VersionSource};
use crate::core::resolver::{self, VersionResolver};
use crate::core::template::{PackageTemplate, TemplateError, TemplateVars};
use crate::error::PlanError;

/// Everything needed to construct a plan
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Package format to build
    pub kind: PackageKind,
    /// Requested package names
    pub packages: Vec<String>,
    /// Requested channel names
    pub channels: Vec<String>,
    /// Kubernetes version or `latest`
    pub kube_version: String,
    /// Package revision suffix
    pub revision: String,
    /// CNI plugins version or `latest`
    pub cni_version: String,
    /// cri-tools version or `latest`
    pub cri_tools_version: String,
    /// Root of the template tree
    pub template_dir: PathBuf,
}

impl BuildRequest {
    /// Request with every version set to `latest` and the default revision
    pub fn new(kind: PackageKind, template_dir: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            packages: Vec::new(),
            channels: Vec::new(),
            kube_version: defaults::LATEST.to_string(),
            revision: defaults::DEFAULT_REVISION.to_string(),
            cni_version: defaults::LATEST.to_string(),
            cri_tools_version: defaults::LATEST.to_string(),
            template_dir: template_dir.into(),
        }
    }

    #[must_use]
    pub fn packages<S: Into<String>>(mut self, packages: impl IntoIterator<Item = S>) -> Self {
        self.packages = packages.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn channels<S: Into<String>>(mut self, channels: impl IntoIterator<Item = S>) -> Self {
        self.channels = channels.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn kube_version(mut self, version: impl Into<String>) -> Self {
        self.kube_version = version.into();
        self
    }

    #[must_use]
    pub fn revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = revision.into();
        self
    }

    #[must_use]
    pub fn cni_version(mut self, version: impl Into<String>) -> Self {
        self.cni_version = version.into();
        self
    }

    #[must_use]
    pub fn cri_tools_version(mut self, version: impl Into<String>) -> Self {
        self.cri_tools_version = version.into();
        self
    }
}

/// One fully resolved unit of packaging work
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildSpec {
    pub package: Package,
    pub kind: PackageKind,
    pub channel: Channel,
    /// Upstream version of this package
    pub version: String,
    pub kube_version: String,
    pub revision: String,
    pub cni_version: String,
    pub cri_tools_version: String,
    /// Where the Kubernetes binaries are downloaded from
    pub download_link_base: String,
    pub template: PackageTemplate,
}

impl BuildSpec {
    /// Identity of the spec within a plan
    pub fn key(&self) -> (Package, Channel, PackageKind) {
        (self.package, self.channel, self.kind)
    }

    /// Version string as the package manager will see it
    pub fn package_version(&self) -> String {
        self.kind.package_version(&self.version)
    }

    /// Template variables for building this spec on `arch`
    pub fn template_vars(&self, arch: Architecture) -> TemplateVars {
        let mut vars = TemplateVars::new();
        vars.set("Name", self.package.as_str())
            .set("Package", self.package.as_str())
            .set("Version", self.package_version())
            .set("Revision", self.revision.as_str())
            .set("Channel", self.channel.as_str())
            .set("Arch", arch.name_for(self.kind))
            .set("GoArch", arch.as_str())
            .set("KubernetesVersion", self.kube_version.as_str())
            .set("CNIVersion", self.cni_version.as_str())
            .set("CRIToolsVersion", self.cri_tools_version.as_str())
            .set(
                "KubeletCNIVersion",
                resolver::kubelet_cni_version(&self.cni_version),
            )
            .set("DownloadLinkBase", self.download_link_base.as_str())
            .set(
                "CNIDownloadLink",
                format!("{}/v{}", urls::CNI_DOWNLOAD, self.cni_version),
            )
            .set(
                "CRIToolsDownloadLink",
                format!("{}/v{}", urls::CRI_TOOLS_DOWNLOAD, self.cri_tools_version),
            );
        vars
    }
}

/// Ordered, de-duplicated build specs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildPlan {
    specs: Vec<BuildSpec>,
}

impl BuildPlan {
    /// Build a plan, collapsing duplicate identities and sorting by
    /// (package name, channel)
    pub fn new(specs: impl IntoIterator<Item = BuildSpec>) -> Self {
        let unique: BTreeMap<_, _> = specs
            .into_iter()
            .map(|spec| ((spec.package.as_str(), spec.channel, spec.kind), spec))
            .collect();
        Self {
            specs: unique.into_values().collect(),
        }
    }

    pub fn specs(&self) -> &[BuildSpec] {
        &self.specs
    }

    pub fn iter(&self) -> impl Iterator<Item = &BuildSpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

/// Kubernetes versions already resolved for this construction, per channel
type KubeCache = HashMap<Channel, semver::Version>;

/// Construct the build plan for `request`
///
/// For every (package x channel) pair the template is located, versions are
/// resolved and one [`BuildSpec`] is produced. The result is sorted by
/// package name, then channel in stability order (stable, unstable,
/// nightly), and contains each (package, channel, kind) at most once.
pub async fn construct_builds<R: VersionResolver>(
    request: &BuildRequest,
    resolver: &R,
) -> Result<BuildPlan, PlanError> {
    if request.packages.is_empty() {
        return Err(PlanError::EmptySelection { what: "packages" });
    }
    if request.channels.is_empty() {
        return Err(PlanError::EmptySelection { what: "channels" });
    }

    let packages = request
        .packages
        .iter()
        .map(|name| {
            name.parse::<Package>()
                .map_err(|name| PlanError::UnknownPackage {
                    name,
                    supported: Package::supported(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let channels = request
        .channels
        .iter()
        .map(|name| {
            name.parse::<Channel>()
                .map_err(|name| PlanError::UnknownChannel {
                    name,
                    supported: Channel::supported(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut cache = KubeCache::new();
    let mut specs = Vec::with_capacity(packages.len() * channels.len());

    for &package in &packages {
        let template = PackageTemplate::load(&request.template_dir, request.kind, package)
            .map_err(|e| template_not_found(request, package, e))?;

        for &channel in &channels {
            let spec = build_spec(request, package, channel, &template, resolver, &mut cache).await?;
            tracing::debug!(
                "Planned {} {} {} ({})",
                spec.package,
                spec.channel,
                spec.version,
                spec.kind
            );
            specs.push(spec);
        }
    }

    let plan = BuildPlan::new(specs);
    tracing::info!(
        "Constructed {} plan with {} build(s)",
        request.kind,
        plan.len()
    );
    Ok(plan)
}

fn template_not_found(request: &BuildRequest, package: Package, error: TemplateError) -> PlanError {
    PlanError::TemplateNotFound {
        package: package.to_string(),
        kind: request.kind.to_string(),
        path: PackageTemplate::path_for(&request.template_dir, request.kind, package),
        reason: error.to_string(),
    }
}

async fn build_spec<R: VersionResolver>(
    request: &BuildRequest,
    package: Package,
    channel: Channel,
    template: &PackageTemplate,
    resolver: &R,
    cache: &mut KubeCache,
) -> Result<BuildSpec, PlanError> {
    let kube = kube_version(request, package, channel, resolver, cache).await?;

    let cni_version = if resolver::is_latest(&request.cni_version) {
        resolver::cni_for_kubernetes(&kube).to_string()
    } else {
        resolver::parse(&request.cni_version)
            .map_err(|e| PlanError::version(package.as_str(), channel.as_str(), "cni", e))?
            .to_string()
    };

    let cri_tools_version = if resolver::is_latest(&request.cri_tools_version) {
        resolver::cri_tools_for_kubernetes(&kube)
    } else {
        resolver::parse(&request.cri_tools_version)
            .map_err(|e| PlanError::version(package.as_str(), channel.as_str(), "cri-tools", e))?
            .to_string()
    };

    let kube_version = kube.to_string();
    let version = match package.version_source() {
        VersionSource::Kubernetes => kube_version.clone(),
        VersionSource::Cni => cni_version.clone(),
        VersionSource::CriTools => cri_tools_version.clone(),
    };

    Ok(BuildSpec {
        package,
        kind: request.kind,
        channel,
        version,
        download_link_base: channel.download_link_base(&kube_version),
        kube_version,
        revision: request.revision.clone(),
        cni_version,
        cri_tools_version,
        template: template.clone(),
    })
}

async fn kube_version<R: VersionResolver>(
    request: &BuildRequest,
    package: Package,
    channel: Channel,
    resolver: &R,
    cache: &mut KubeCache,
) -> Result<semver::Version, PlanError> {
    let failed = |e: resolver::ResolveError| PlanError::version(package.as_str(), channel.as_str(), "kubernetes", e);

    if !resolver::is_latest(&request.kube_version) {
        return resolver::parse_kubernetes(&request.kube_version).map_err(failed);
    }

    if let Some(version) = cache.get(&channel) {
        return Ok(version.clone());
    }

    let raw = resolver.resolve(channel).await.map_err(failed)?;
    let version = resolver::parse_kubernetes(&raw).map_err(failed)?;
    tracing::info!("Resolved {channel} Kubernetes version: {version}");
    cache.insert(channel, version.clone());
    Ok(version)
}
