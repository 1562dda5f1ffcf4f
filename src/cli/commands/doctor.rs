//! CLI command for `kubepkg doctor`
//!
//! Reports which packaging tools are installed and whether the template tree
//! is complete.

use anyhow::Result;
use std::path::Path;

use crate::cli::output::{status, OutputConfig};
use crate::core::doctor::run_doctor;

/// Version line including the git commit and target the binary was built from
fn build_info() -> String {
    format!(
        "kubepkg {} ({}, {})",
        env!("CARGO_PKG_VERSION"),
        option_env!("VERGEN_GIT_SHA").unwrap_or("unknown commit"),
        option_env!("VERGEN_CARGO_TARGET_TRIPLE").unwrap_or("unknown target"),
    )
}

/// Execute the doctor command
pub fn execute(template_dir: &Path, output: &OutputConfig) -> Result<()> {
    let report = run_doctor(template_dir);

    if output.is_json() {
        let json_result = serde_json::json!({
            "status": if report.all_passed() { "success" } else if report.has_errors() { "error" } else { "warning" },
            "build": build_info(),
            "template_dir": template_dir,
            "checks": report.checks.iter().map(|c| serde_json::json!({
                "name": c.name,
                "passed": c.passed,
                "required": c.required,
                "version": c.version,
                "error": c.error,
                "suggestion": c.suggestion
            })).collect::<Vec<_>>(),
            "config_issues": report.config_issues,
            "passed_count": report.passed_count(),
            "total_count": report.checks.len()
        });
        println!("{}", serde_json::to_string_pretty(&json_result).unwrap_or_default());

        if report.has_errors() {
            return Err(anyhow::anyhow!("Template tree has problems"));
        }
        return Ok(());
    }

    if output.is_quiet() {
        for issue in &report.config_issues {
            eprintln!("{} {issue}", status::ERROR);
        }
        if report.has_errors() {
            return Err(anyhow::anyhow!("Template tree has problems"));
        }
        return Ok(());
    }

    output.print_info(&build_info());
    output.print_info("Checking packaging tools...");
    println!();

    for check in &report.checks {
        let version_str = check
            .version
            .as_ref()
            .map(|v| format!(" (v{v})"))
            .unwrap_or_default();

        if check.passed {
            println!("  {} {}{version_str}", status::SUCCESS, check.name);
        } else {
            println!("  {} {}", status::ERROR, check.name);
            if let Some(error) = &check.error {
                output.print_detail(&format!("Error: {error}"));
            }
            if let Some(suggestion) = &check.suggestion {
                output.print_detail(&format!("Suggestion: {suggestion}"));
            }
        }
    }

    println!();
    if report.config_issues.is_empty() {
        output.print_success(&format!("Templates in {} look complete", template_dir.display()));
    } else {
        output.print_warning(&format!("Template issues in {}:", template_dir.display()));
        for issue in &report.config_issues {
            output.print_detail(&format!("• {issue}"));
        }
    }

    if report.has_errors() {
        return Err(anyhow::anyhow!(
            "Template tree has problems. Run 'kubepkg doctor' for details."
        ));
    }
    if report.passed_count() == 0 {
        output.print_warning("No package builder found; only --spec-only runs will work");
    }
    Ok(())
}
