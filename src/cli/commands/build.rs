//! Build command implementation
//!
//! Implements `kubepkg debs` and `kubepkg rpms`: construct the plan, walk it
//! over every requested architecture and report per-package results.

use anyhow::{Context, Result};

use crate::cli::output::{status, OutputConfig};
use crate::core::kind::PackageKind;
use crate::core::options::RootOptions;
use crate::core::plan::construct_builds;
use crate::core::walker::{walk_builds, Outcome, WalkReport};
use crate::infra::release::ReleaseMarkerResolver;
use crate::infra::toolchain::SystemBuilder;

/// Execute a build for `kind`
pub async fn execute(kind: PackageKind, options: &RootOptions, output: &OutputConfig) -> Result<()> {
    options.validate().context("Invalid options")?;
    let architectures = options.architecture_set()?;

    let resolver = ReleaseMarkerResolver::with_base_url(options.release_base_url.as_str());
    let plan = construct_builds(&options.build_request(kind), &resolver)
        .await
        .with_context(|| format!("Failed to construct {kind} build plan"))?;

    tracing::info!(
        "Planned {} {kind} build(s) for {} architecture(s)",
        plan.len(),
        architectures.len()
    );
    output.print_info(&format!(
        "Building {} {kind} package(s) for {} architecture(s){}",
        plan.len(),
        architectures.len(),
        if options.spec_only { " (spec only)" } else { "" }
    ));

    let total = (plan.len() * architectures.len()) as u64;
    let bar = output.build_bar(total);
    let mut walk_options = options.walk_options();
    if let Some(bar) = &bar {
        bar.set_message(kind.as_str());
        let bar = bar.clone();
        walk_options = walk_options.with_progress(Box::new(move |done: u64, _total: u64| bar.set_position(done)));
    }

    let builder = SystemBuilder::new();
    let result = walk_builds(&plan, &architectures, &walk_options, &builder).await;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    match result {
        Ok(report) => {
            print_report(&report, output);
            output.print_success(&format!("{} {kind} package build(s) finished", report.total()));
            Ok(())
        }
        Err(err) => {
            if let Some(report) = err.report() {
                print_report(report, output);
            }
            Err(anyhow::Error::new(err).context(format!("{kind} build failed")))
        }
    }
}

fn print_report(report: &WalkReport, output: &OutputConfig) {
    if output.is_json() {
        let results: Vec<_> = report
            .results()
            .iter()
            .map(|r| {
                serde_json::json!({
                    "package": r.pair.package,
                    "channel": r.pair.channel,
                    "kind": r.pair.kind,
                    "arch": r.pair.arch,
                    "work_dir": r.work_dir,
                    "success": r.is_success(),
                    "artifacts": r.artifacts(),
                    "error": r.error().map(ToString::to_string),
                })
            })
            .collect();
        let json = serde_json::json!({
            "status": if report.failed_count() == 0 { "success" } else { "error" },
            "total": report.total(),
            "failed": report.failed_count(),
            "results": results,
        });
        println!("{}", serde_json::to_string_pretty(&json).unwrap_or_default());
        return;
    }

    if output.is_quiet() {
        return;
    }

    for result in report.results() {
        match &result.outcome {
            Outcome::Rendered { spec_dir } => {
                println!("  {} {} -> {}", status::SUCCESS, result.pair, spec_dir.display());
            }
            Outcome::Built { artifacts } => {
                println!("  {} {}", status::SUCCESS, result.pair);
                for artifact in artifacts {
                    output.print_detail(&format!(
                        "{} (sha256 {})",
                        artifact.path.display(),
                        artifact.sha256
                    ));
                }
            }
            Outcome::Failed(error) => {
                println!("  {} {}", status::ERROR, result.pair);
                output.print_detail(&error.to_string());
            }
        }
    }
}
