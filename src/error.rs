//! Error types for kubepkg
//!
//! Domain-specific error types using thiserror. Errors owned by a single
//! module (resolver, template, toolchain, walker) live next to that module.

use std::path::PathBuf;
use thiserror::Error;

use crate::core::template::TemplateError;
use crate::infra::toolchain::ToolchainError;

/// Build plan construction errors
///
/// All of these describe a plan that cannot be well-formed, so they abort the
/// run before any package is built.
#[derive(Error, Debug)]
pub enum PlanError {
    /// No packages or no channels were requested
    #[error("No {what} selected")]
    EmptySelection { what: &'static str },

    /// Package is not one of the supported components
    #[error("Unknown package '{name}': must be one of {supported}")]
    UnknownPackage { name: String, supported: String },

    /// Channel is not a known release track
    #[error("Unknown channel '{name}': must be one of {supported}")]
    UnknownChannel { name: String, supported: String },

    /// No template exists for the package and kind
    #[error("No {kind} template for '{package}' at '{path}': {reason}")]
    TemplateNotFound {
        package: String,
        kind: String,
        path: PathBuf,
        reason: String,
    },

    /// A version had to be looked up or derived and that failed
    #[error("Failed to resolve {what} version for '{package}' on channel '{channel}': {reason}")]
    VersionResolutionFailed {
        package: String,
        channel: String,
        what: &'static str,
        reason: String,
    },
}

impl PlanError {
    pub(crate) fn version(
        package: &str,
        channel: &str,
        what: &'static str,
        reason: impl ToString,
    ) -> Self {
        Self::VersionResolutionFailed {
            package: package.to_string(),
            channel: channel.to_string(),
            what,
            reason: reason.to_string(),
        }
    }
}

/// Errors for a single (build spec, architecture) pair
///
/// These never abort a walk on their own; the walker records them and keeps
/// going.
#[derive(Error, Debug)]
pub enum PairError {
    /// Rendering the packaging tree failed
    #[error("Template render failed: {0}")]
    TemplateRenderFailed(#[from] TemplateError),

    /// The packaging builder failed
    #[error("Toolchain invocation failed: {0}")]
    ToolchainInvocationFailed(#[from] ToolchainError),

    /// A produced artifact could not be read back
    #[error("Artifact unreadable: {0}")]
    ArtifactUnreadable(#[from] FilesystemError),

    /// The template does not support this architecture
    #[error("Architecture '{arch}' is not supported by the '{package}' template (supported: {supported})")]
    UnsupportedArchitecture {
        package: String,
        arch: String,
        supported: String,
    },
}

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to remove directory
    #[error("Failed to remove directory '{path}': {error}")]
    RemoveDir { path: PathBuf, error: String },

    /// Failed to write file
    #[error("Failed to write file '{path}': {error}")]
    WriteFile { path: PathBuf, error: String },

    /// Failed to read file
    #[error("Failed to read file '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },

    /// Failed to copy file permissions
    #[error("Failed to set permissions on '{path}': {error}")]
    Permissions { path: PathBuf, error: String },
}

/// Top-level error for library callers driving a whole run
#[derive(Error, Debug)]
pub enum KubepkgError {
    #[error(transparent)]
    Options(#[from] crate::core::options::OptionsError),

    #[error(transparent)]
    Config(#[from] crate::core::global_config::ConfigError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Walk(#[from] crate::core::walker::WalkError),

    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
}
