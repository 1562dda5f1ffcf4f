//! CLI command for `kubepkg plan`
//!
//! Resolves the build plan and prints it without rendering or building.

use anyhow::{Context, Result};

use crate::cli::output::OutputConfig;
use crate::core::kind::PackageKind;
use crate::core::options::RootOptions;
use crate::core::plan::construct_builds;
use crate::infra::release::ReleaseMarkerResolver;

/// Execute the plan command
pub async fn execute(kind: PackageKind, options: &RootOptions, output: &OutputConfig) -> Result<()> {
    options.validate().context("Invalid options")?;
    let architectures = options.architecture_set()?;

    let resolver = ReleaseMarkerResolver::with_base_url(options.release_base_url.as_str());
    let plan = construct_builds(&options.build_request(kind), &resolver)
        .await
        .with_context(|| format!("Failed to construct {kind} build plan"))?;

    if output.is_json() {
        let json = serde_json::json!({
            "kind": kind,
            "architectures": architectures,
            "builds": plan.specs(),
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    if output.is_quiet() {
        return Ok(());
    }

    output.print_info(&format!(
        "{} {kind} build(s) x {} architecture(s)",
        plan.len(),
        architectures.len()
    ));
    for spec in plan.iter() {
        println!(
            "  {:<16} {:<9} {}-{}",
            spec.package.as_str(),
            spec.channel.as_str(),
            spec.package_version(),
            spec.revision
        );
        output.print_detail(&format!(
            "kubernetes {}, cni {}, cri-tools {}",
            spec.kube_version, spec.cni_version, spec.cri_tools_version
        ));
    }
    Ok(())
}
