//! Packaging toolchain invocation
//!
//! Wraps `dpkg-buildpackage` and `rpmbuild` behind [`PackageBuilder`] so the
//! walker can be driven by a fake builder in tests.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;
use walkdir::WalkDir;

use crate::config::defaults;
use crate::core::channel::Channel;
use crate::core::kind::{Architecture, PackageKind};
use crate::core::package::Package;

/// Builder invocation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolchainError {
    /// Builder binary is not on PATH
    #[error("'{tool}' not found in PATH")]
    NotFound { tool: String },

    /// Builder could not be started
    #[error("Failed to run '{tool}': {error}")]
    Spawn { tool: String, error: String },

    /// Builder exited unsuccessfully
    #[error("'{tool}' exited with {status}: {stderr}")]
    Failed {
        tool: String,
        status: String,
        stderr: String,
    },

    /// Builder succeeded but left nothing behind
    #[error("'{tool}' produced no .{extension} files in '{dir}'")]
    NoArtifacts {
        tool: String,
        extension: String,
        dir: PathBuf,
    },
}

/// One package build handed to a builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildJob {
    pub package: Package,
    pub kind: PackageKind,
    pub channel: Channel,
    pub arch: Architecture,
    /// Isolated directory owned by this job
    pub work_dir: PathBuf,
    /// Rendered packaging tree inside `work_dir`
    pub source_dir: PathBuf,
}

/// Something that turns a rendered packaging tree into artifacts
#[allow(async_fn_in_trait)]
pub trait PackageBuilder {
    /// Build `job`, returning the produced artifact paths
    async fn build(&self, job: &BuildJob) -> Result<Vec<PathBuf>, ToolchainError>;
}

/// Debian builder using `dpkg-buildpackage`
#[derive(Debug, Clone)]
pub struct DebBuilder {
    tool: String,
}

impl DebBuilder {
    pub const TOOL: &'static str = "dpkg-buildpackage";

    pub fn new() -> Self {
        Self {
            tool: Self::TOOL.to_string(),
        }
    }

    /// Arguments for an unsigned, binary-only cross build
    pub fn args(job: &BuildJob) -> Vec<String> {
        vec![
            "--unsigned-source".to_string(),
            "--unsigned-changes".to_string(),
            "--build=binary".to_string(),
            format!("--host-arch={}", job.arch.name_for(PackageKind::Deb)),
        ]
    }
}

impl Default for DebBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageBuilder for DebBuilder {
    async fn build(&self, job: &BuildJob) -> Result<Vec<PathBuf>, ToolchainError> {
        run_tool(&self.tool, &Self::args(job), &job.source_dir).await?;
        // dpkg-buildpackage drops its output next to the source tree
        collect_artifacts(&self.tool, &job.work_dir, PackageKind::Deb, 1)
    }
}

/// RPM builder using `rpmbuild`
#[derive(Debug, Clone)]
pub struct RpmBuilder {
    tool: String,
}

impl RpmBuilder {
    pub const TOOL: &'static str = "rpmbuild";

    pub fn new() -> Self {
        Self {
            tool: Self::TOOL.to_string(),
        }
    }

    /// Spec file the template is expected to provide
    pub fn spec_file(job: &BuildJob) -> PathBuf {
        job.source_dir
            .join("SPECS")
            .join(format!("{}.spec", job.package))
    }

    /// Arguments building binary packages with the rendered tree as topdir
    pub fn args(job: &BuildJob) -> Vec<String> {
        vec![
            "--define".to_string(),
            format!("_topdir {}", job.source_dir.display()),
            "--target".to_string(),
            job.arch.name_for(PackageKind::Rpm).to_string(),
            "-bb".to_string(),
            Self::spec_file(job).display().to_string(),
        ]
    }
}

impl Default for RpmBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageBuilder for RpmBuilder {
    async fn build(&self, job: &BuildJob) -> Result<Vec<PathBuf>, ToolchainError> {
        run_tool(&self.tool, &Self::args(job), &job.source_dir).await?;
        collect_artifacts(
            &self.tool,
            &job.source_dir.join("RPMS"),
            PackageKind::Rpm,
            usize::MAX,
        )
    }
}

/// Builder dispatching on the job's package kind
#[derive(Debug, Clone, Default)]
pub struct SystemBuilder {
    deb: DebBuilder,
    rpm: RpmBuilder,
}

impl SystemBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the external tool used for `kind`
    pub fn tool_for(kind: PackageKind) -> &'static str {
        match kind {
            PackageKind::Deb => DebBuilder::TOOL,
            PackageKind::Rpm => RpmBuilder::TOOL,
        }
    }
}

impl PackageBuilder for SystemBuilder {
    async fn build(&self, job: &BuildJob) -> Result<Vec<PathBuf>, ToolchainError> {
        match job.kind {
            PackageKind::Deb => self.deb.build(job).await,
            PackageKind::Rpm => self.rpm.build(job).await,
        }
    }
}

/// Locate a tool on PATH
pub fn find_tool(tool: &str) -> Option<PathBuf> {
    which::which(tool).ok()
}

async fn run_tool(tool: &str, args: &[String], cwd: &Path) -> Result<(), ToolchainError> {
    let program = find_tool(tool).ok_or_else(|| ToolchainError::NotFound {
        tool: tool.to_string(),
    })?;

    tracing::debug!("Running {tool} {} in {}", args.join(" "), cwd.display());
    let output = Command::new(&program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| ToolchainError::Spawn {
            tool: tool.to_string(),
            error: e.to_string(),
        })?;

    if output.status.success() {
        return Ok(());
    }

    Err(ToolchainError::Failed {
        tool: tool.to_string(),
        status: output.status.to_string(),
        stderr: stderr_tail(&output.stderr),
    })
}

/// Last few kilobytes of stderr, on a character boundary
fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    if text.len() <= defaults::STDERR_TAIL_BYTES {
        return text.to_string();
    }
    let mut start = text.len() - defaults::STDERR_TAIL_BYTES;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    format!("...{}", &text[start..])
}

fn collect_artifacts(
    tool: &str,
    dir: &Path,
    kind: PackageKind,
    max_depth: usize,
) -> Result<Vec<PathBuf>, ToolchainError> {
    let extension = kind.artifact_extension();
    let artifacts: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| path.extension().is_some_and(|ext| ext == extension))
        .collect();

    if artifacts.is_empty() {
        return Err(ToolchainError::NoArtifacts {
            tool: tool.to_string(),
            extension: extension.to_string(),
            dir: dir.to_path_buf(),
        });
    }
    Ok(artifacts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn job(kind: PackageKind, arch: Architecture, root: &Path) -> BuildJob {
        BuildJob {
            package: Package::Kubelet,
            kind,
            channel: Channel::Stable,
            arch,
            work_dir: root.to_path_buf(),
            source_dir: root.join("src"),
        }
    }

    #[test]
    fn test_deb_args_use_debian_arch() {
        let args = DebBuilder::args(&job(PackageKind::Deb, Architecture::Arm, Path::new("/w")));
        assert!(args.contains(&"--host-arch=armhf".to_string()));
        assert!(args.contains(&"--build=binary".to_string()));
    }

    #[test]
    fn test_rpm_args_use_rpm_arch_and_spec() {
        let job = job(PackageKind::Rpm, Architecture::Arm64, Path::new("/w"));
        let args = RpmBuilder::args(&job);
        assert_eq!(args[1], "_topdir /w/src");
        assert_eq!(args[3], "aarch64");
        assert_eq!(args[5], "/w/src/SPECS/kubelet.spec");
    }

    #[test]
    fn test_tool_for_kind() {
        assert_eq!(SystemBuilder::tool_for(PackageKind::Deb), "dpkg-buildpackage");
        assert_eq!(SystemBuilder::tool_for(PackageKind::Rpm), "rpmbuild");
    }

    #[test]
    fn test_collect_deb_artifacts_ignores_nested() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("kubelet_1.19.2-0_amd64.deb"), b"deb").unwrap();
        std::fs::write(dir.path().join("kubelet_1.19.2-0_amd64.changes"), b"x").unwrap();
        std::fs::write(dir.path().join("src/nested.deb"), b"deb").unwrap();

        let artifacts = collect_artifacts("dpkg-buildpackage", dir.path(), PackageKind::Deb, 1).unwrap();
        assert_eq!(artifacts, vec![dir.path().join("kubelet_1.19.2-0_amd64.deb")]);
    }

    #[test]
    fn test_collect_without_artifacts() {
        let dir = TempDir::new().unwrap();
        let err = collect_artifacts("rpmbuild", dir.path(), PackageKind::Rpm, usize::MAX).unwrap_err();
        assert!(matches!(err, ToolchainError::NoArtifacts { .. }));
    }

    #[test]
    fn test_stderr_tail_truncates() {
        let long = "x".repeat(defaults::STDERR_TAIL_BYTES + 10);
        let tail = stderr_tail(long.as_bytes());
        assert!(tail.starts_with("..."));
        assert_eq!(tail.len(), defaults::STDERR_TAIL_BYTES + 3);
    }

    #[tokio::test]
    async fn test_missing_tool_is_reported() {
        let err = run_tool("kubepkg-no-such-builder", &[], Path::new("."))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ToolchainError::NotFound {
                tool: "kubepkg-no-such-builder".to_string()
            }
        );
    }
}
