//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod build;
pub mod doctor;
pub mod plan;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::cli::output::OutputConfig;
use crate::core::global_config::GlobalConfig;
use crate::core::kind::PackageKind;
use crate::core::options::RootOptions;
use crate::infra::dirs::KubepkgDirs;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build Debian packages
    Debs {
        #[command(flatten)]
        root: RootArgs,

        #[command(flatten)]
        walk: WalkArgs,
    },

    /// Build RPM packages
    Rpms {
        #[command(flatten)]
        root: RootArgs,

        #[command(flatten)]
        walk: WalkArgs,
    },

    /// Resolve and print the build plan without building
    Plan {
        /// Package kind to plan for (deb or rpm)
        #[arg(long, default_value = "deb")]
        kind: PackageKind,

        #[command(flatten)]
        root: RootArgs,
    },

    /// Check packaging tools and templates
    Doctor {
        /// Template directory to check
        #[arg(long, env = "KUBEPKG_TEMPLATE_DIR")]
        template_dir: Option<PathBuf>,
    },
}

impl Commands {
    /// Execute the command
    pub async fn run(self, output: &OutputConfig) -> Result<()> {
        let config = load_global_config()?;
        match self {
            Self::Debs { root, walk } => {
                let options = walk.apply(root.resolve(&config));
                build::execute(PackageKind::Deb, &options, output).await
            }
            Self::Rpms { root, walk } => {
                let options = walk.apply(root.resolve(&config));
                build::execute(PackageKind::Rpm, &options, output).await
            }
            Self::Plan { kind, root } => plan::execute(kind, &root.resolve(&config), output).await,
            Self::Doctor { template_dir } => {
                let options = RootOptions::from_config(&config);
                let template_dir = template_dir.unwrap_or(options.template_dir);
                doctor::execute(&template_dir, output)
            }
        }
    }
}

/// Flags shared by the build and plan commands
///
/// Unset flags fall back to the config file, then to built-in defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct RootArgs {
    /// Architectures to build for (comma separated)
    #[arg(long = "arch", value_delimiter = ',')]
    pub architectures: Option<Vec<String>>,

    /// Release channels to build for (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub channels: Option<Vec<String>>,

    /// Packages to build (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub packages: Option<Vec<String>>,

    /// Kubernetes version to package, or "latest"
    #[arg(long)]
    pub kube_version: Option<String>,

    /// Package revision
    #[arg(long)]
    pub revision: Option<String>,

    /// CNI plugins version, or "latest"
    #[arg(long)]
    pub cni_version: Option<String>,

    /// cri-tools version, or "latest"
    #[arg(long)]
    pub cri_tools_version: Option<String>,

    /// Root of the packaging template tree
    #[arg(long, env = "KUBEPKG_TEMPLATE_DIR")]
    pub template_dir: Option<PathBuf>,
}

/// Flags that only matter when the plan is walked
#[derive(Args, Debug, Clone, Default)]
pub struct WalkArgs {
    /// Where work directories and packages are written
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Only render packaging files, do not run the package builders
    #[arg(long)]
    pub spec_only: bool,
}

impl RootArgs {
    /// Options with priority flags > config file > defaults
    pub fn resolve(self, config: &GlobalConfig) -> RootOptions {
        let defaults = RootOptions::from_config(config);
        RootOptions {
            architectures: self.architectures.unwrap_or(defaults.architectures),
            channels: self.channels.unwrap_or(defaults.channels),
            packages: self.packages.unwrap_or(defaults.packages),
            kube_version: self.kube_version.unwrap_or(defaults.kube_version),
            revision: self.revision.unwrap_or(defaults.revision),
            cni_version: self.cni_version.unwrap_or(defaults.cni_version),
            cri_tools_version: self.cri_tools_version.unwrap_or(defaults.cri_tools_version),
            template_dir: self.template_dir.unwrap_or(defaults.template_dir),
            output_dir: defaults.output_dir,
            spec_only: false,
            release_base_url: defaults.release_base_url,
        }
    }
}

impl WalkArgs {
    /// Overlay the walk flags on resolved options
    pub fn apply(self, mut options: RootOptions) -> RootOptions {
        if let Some(output_dir) = self.output_dir {
            options.output_dir = output_dir;
        }
        options.spec_only = self.spec_only;
        options
    }
}

fn load_global_config() -> Result<GlobalConfig> {
    let dirs = KubepkgDirs::new();
    GlobalConfig::load(&dirs).with_context(|| {
        format!(
            "Failed to load configuration from {}",
            dirs.global_config_path().display()
        )
    })
}
