//! Build plan execution
//!
//! [`walk_builds`] runs every (build spec x architecture) pair of a plan in
//! order: specs outermost, architectures inside, so all architectures of one
//! package are attempted before the next package. A failing pair is recorded
//! and the walk moves on; failures are reported together at the end.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::channel::Channel;
use crate::core::kind::{Architecture, ArchitectureSet, PackageKind};
use crate::core::package::Package;
use crate::core::plan::{BuildPlan, BuildSpec};
use crate::core::template::TemplateError;
use crate::error::PairError;
use crate::infra::filesystem;
use crate::infra::toolchain::{BuildJob, PackageBuilder};

/// Manifest written next to every rendered tree
pub const MANIFEST_FILE: &str = "buildspec.json";

/// Progress callback type, called with (finished pairs, total pairs)
pub type ProgressCallback = Box<dyn Fn(u64, u64) + Send + Sync>;

/// How to walk a plan
pub struct WalkOptions {
    /// Render packaging trees without invoking the builder
    pub spec_only: bool,
    /// Root under which every pair gets its own work directory
    pub output_dir: PathBuf,
    /// Optional progress reporting
    pub progress: Option<ProgressCallback>,
}

impl WalkOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            spec_only: false,
            output_dir: output_dir.into(),
            progress: None,
        }
    }

    #[must_use]
    pub fn spec_only(mut self, spec_only: bool) -> Self {
        self.spec_only = spec_only;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }
}

impl fmt::Debug for WalkOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalkOptions")
            .field("spec_only", &self.spec_only)
            .field("output_dir", &self.output_dir)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// Identity of one (build spec, architecture) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PairId {
    pub package: Package,
    pub channel: Channel,
    pub kind: PackageKind,
    pub arch: Architecture,
}

impl PairId {
    fn new(spec: &BuildSpec, arch: Architecture) -> Self {
        Self {
            package: spec.package,
            channel: spec.channel,
            kind: spec.kind,
            arch,
        }
    }

    /// Work directory of this pair under `output_dir`
    pub fn work_dir(&self, output_dir: &Path) -> PathBuf {
        output_dir
            .join(self.kind.as_str())
            .join(self.channel.as_str())
            .join(self.arch.as_str())
            .join(self.package.as_str())
    }
}

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{} ({})",
            self.package, self.channel, self.arch, self.kind
        )
    }
}

/// A produced package file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub path: PathBuf,
    pub sha256: String,
}

/// What happened to one pair
#[derive(Debug)]
pub enum Outcome {
    /// Spec-only run: the packaging tree was rendered
    Rendered { spec_dir: PathBuf },
    /// The builder produced packages
    Built { artifacts: Vec<Artifact> },
    /// The pair failed
    Failed(PairError),
}

/// Result of one pair
#[derive(Debug)]
pub struct ExecutionResult {
    pub pair: PairId,
    pub work_dir: PathBuf,
    pub outcome: Outcome,
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        !matches!(self.outcome, Outcome::Failed(_))
    }

    /// Packages produced for this pair
    pub fn artifacts(&self) -> &[Artifact] {
        match &self.outcome {
            Outcome::Built { artifacts } => artifacts,
            Outcome::Rendered { .. } | Outcome::Failed(_) => &[],
        }
    }

    /// Failure cause, if the pair failed
    pub fn error(&self) -> Option<&PairError> {
        match &self.outcome {
            Outcome::Failed(error) => Some(error),
            Outcome::Rendered { .. } | Outcome::Built { .. } => None,
        }
    }
}

/// Results of a whole walk, in walk order
#[derive(Debug, Default)]
pub struct WalkReport {
    results: Vec<ExecutionResult>,
}

impl WalkReport {
    pub fn results(&self) -> &[ExecutionResult] {
        &self.results
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.is_success()).count()
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &ExecutionResult> {
        self.results.iter().filter(|r| r.is_success())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&PairId, &PairError)> {
        self.results
            .iter()
            .filter_map(|r| r.error().map(|e| (&r.pair, e)))
    }

    /// Every artifact built during the walk
    pub fn artifacts(&self) -> impl Iterator<Item = &Artifact> {
        self.results.iter().flat_map(ExecutionResult::artifacts)
    }

    /// Human readable list of failed pairs and their causes
    pub fn failure_summary(&self) -> String {
        let mut summary = format!(
            "{} of {} package builds failed:",
            self.failed_count(),
            self.total()
        );
        for (pair, error) in self.failures() {
            summary.push_str(&format!("\n  - {pair}: {error}"));
        }
        summary
    }
}

/// Walk errors
#[derive(Error, Debug)]
pub enum WalkError {
    /// Nothing to build
    #[error("Build plan is empty")]
    EmptyPlan,

    /// No architectures to build for
    #[error("No target architectures selected")]
    NoArchitectures,

    /// At least one pair failed; the report keeps every result
    #[error("{}", report.failure_summary())]
    Aggregate { report: WalkReport },
}

impl WalkError {
    /// The full report, when the walk ran to completion
    pub fn report(&self) -> Option<&WalkReport> {
        match self {
            Self::Aggregate { report } => Some(report),
            Self::EmptyPlan | Self::NoArchitectures => None,
        }
    }
}

#[derive(Serialize)]
struct PairManifest<'a> {
    package: Package,
    kind: PackageKind,
    channel: Channel,
    arch: Architecture,
    package_arch: &'a str,
    version: &'a str,
    package_version: String,
    revision: &'a str,
    kube_version: &'a str,
    cni_version: &'a str,
    cri_tools_version: &'a str,
    download_link_base: &'a str,
    template_dir: &'a Path,
    files: &'a [PathBuf],
}

/// Execute `plan` for every architecture in `architectures`
///
/// Returns the report when every pair succeeded, and
/// [`WalkError::Aggregate`] carrying the same report otherwise.
pub async fn walk_builds<B: PackageBuilder>(
    plan: &BuildPlan,
    architectures: &ArchitectureSet,
    options: &WalkOptions,
    builder: &B,
) -> Result<WalkReport, WalkError> {
    if plan.is_empty() {
        return Err(WalkError::EmptyPlan);
    }
    if architectures.is_empty() {
        return Err(WalkError::NoArchitectures);
    }

    let total = (plan.len() * architectures.len()) as u64;
    let mut report = WalkReport::default();
    tracing::info!(
        "Walking {} build(s) x {} architecture(s){}",
        plan.len(),
        architectures.len(),
        if options.spec_only { " (spec only)" } else { "" }
    );

    for spec in plan.iter() {
        for arch in architectures.iter() {
            let pair = PairId::new(spec, arch);
            let work_dir = pair.work_dir(&options.output_dir);
            tracing::info!("Building {pair}");

            let outcome = match run_pair(spec, &pair, &work_dir, options.spec_only, builder).await {
                Ok(outcome) => {
                    tracing::info!("Finished {pair}");
                    outcome
                }
                Err(error) => {
                    tracing::warn!("Failed {pair}: {error}");
                    Outcome::Failed(error)
                }
            };

            report.results.push(ExecutionResult {
                pair,
                work_dir,
                outcome,
            });

            if let Some(progress) = &options.progress {
                progress(report.total() as u64, total);
            }
        }
    }

    if report.failed_count() > 0 {
        return Err(WalkError::Aggregate { report });
    }
    Ok(report)
}

async fn run_pair<B: PackageBuilder>(
    spec: &BuildSpec,
    pair: &PairId,
    work_dir: &Path,
    spec_only: bool,
    builder: &B,
) -> Result<Outcome, PairError> {
    // Nothing from an earlier run may survive, even when the pair is rejected
    filesystem::remove_dir_all(work_dir).map_err(TemplateError::from)?;
    if !spec.template.metadata.supports(pair.arch) {
        return Err(PairError::UnsupportedArchitecture {
            package: spec.package.to_string(),
            arch: pair.arch.to_string(),
            supported: spec.template.metadata.supported_list(),
        });
    }

    let source_dir = work_dir.join("src");
    let files = spec
        .template
        .render(&spec.template_vars(pair.arch), &source_dir)?;
    write_manifest(spec, pair, work_dir, &files)?;

    if spec_only {
        return Ok(Outcome::Rendered {
            spec_dir: source_dir,
        });
    }

    let job = BuildJob {
        package: pair.package,
        kind: pair.kind,
        channel: pair.channel,
        arch: pair.arch,
        work_dir: work_dir.to_path_buf(),
        source_dir,
    };
    let paths = builder.build(&job).await?;

    let mut artifacts = Vec::with_capacity(paths.len());
    for path in paths {
        let sha256 = filesystem::sha256_file(&path)?;
        tracing::debug!("Built {} ({sha256})", path.display());
        artifacts.push(Artifact { path, sha256 });
    }
    Ok(Outcome::Built { artifacts })
}

fn write_manifest(
    spec: &BuildSpec,
    pair: &PairId,
    work_dir: &Path,
    files: &[PathBuf],
) -> Result<(), TemplateError> {
    let manifest = PairManifest {
        package: pair.package,
        kind: pair.kind,
        channel: pair.channel,
        arch: pair.arch,
        package_arch: pair.arch.name_for(pair.kind),
        version: &spec.version,
        package_version: spec.package_version(),
        revision: &spec.revision,
        kube_version: &spec.kube_version,
        cni_version: &spec.cni_version,
        cri_tools_version: &spec.cri_tools_version,
        download_link_base: &spec.download_link_base,
        template_dir: &spec.template.dir,
        files,
    };
    let json = serde_json::to_string_pretty(&manifest).map_err(|e| TemplateError::Manifest {
        error: e.to_string(),
    })?;
    filesystem::write_file(&work_dir.join(MANIFEST_FILE), json + "\n")?;
    Ok(())
}
