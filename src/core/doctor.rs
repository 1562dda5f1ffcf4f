//! Doctor command logic
//!
//! Checks that the packaging tools are installed and that the template tree
//! has a usable template for every package.

use std::path::Path;
use std::process::Command;

use crate::core::kind::PackageKind;
use crate::core::package::Package;
use crate::core::template::PackageTemplate;
use crate::infra::toolchain::{find_tool, SystemBuilder};

/// Result of a single dependency check
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name of the dependency being checked
    pub name: String,
    /// Whether the check passed
    pub passed: bool,
    /// Version if available
    pub version: Option<String>,
    /// Error message if check failed
    pub error: Option<String>,
    /// Suggestion for fixing the issue
    pub suggestion: Option<String>,
    /// Whether this is a required or optional dependency
    pub required: bool,
}

impl CheckResult {
    /// Create a passing check result
    pub fn pass(name: &str, version: Option<String>, required: bool) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            version,
            error: None,
            suggestion: None,
            required,
        }
    }

    /// Create a failing check result
    pub fn fail(name: &str, error: &str, suggestion: Option<&str>, required: bool) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            version: None,
            error: Some(error.to_string()),
            suggestion: suggestion.map(String::from),
            required,
        }
    }
}

/// Overall doctor report
#[derive(Debug, Default)]
pub struct DoctorReport {
    /// Individual check results
    pub checks: Vec<CheckResult>,
    /// Template tree problems
    pub config_issues: Vec<String>,
}

impl DoctorReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_check(&mut self, result: CheckResult) {
        self.checks.push(result);
    }

    pub fn add_config_issue(&mut self, issue: String) {
        self.config_issues.push(issue);
    }

    /// Check if all checks passed and the template tree is sound
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed) && self.config_issues.is_empty()
    }

    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    /// Get all failed required checks
    pub fn failed_required(&self) -> Vec<&CheckResult> {
        self.checks
            .iter()
            .filter(|c| c.required && !c.passed)
            .collect()
    }

    /// Whether the run should be reported as a failure
    pub fn has_errors(&self) -> bool {
        !self.failed_required().is_empty() || !self.config_issues.is_empty()
    }
}

/// Version reported by `tool --version`, if it runs
fn tool_version(tool: &Path) -> Option<String> {
    let output = Command::new(tool).arg("--version").output().ok()?;
    let combined = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    extract_version(&combined)
}

/// Extract version string from command output
fn extract_version(output: &str) -> Option<String> {
    let version_regex = regex::Regex::new(r"v?(\d+\.\d+(?:\.\d+)?(?:-\w+)?)").ok()?;
    version_regex
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Check the builder for `kind`
///
/// Each builder is optional on its own; a machine usually only has one.
pub fn check_builder(kind: PackageKind) -> CheckResult {
    let tool = SystemBuilder::tool_for(kind);
    let name = format!("{tool} ({kind} packages)");
    match find_tool(tool) {
        Some(path) => CheckResult::pass(&name, tool_version(&path), false),
        None => {
            let suggestion = match kind {
                PackageKind::Deb => "Install dpkg-dev (apt-get install dpkg-dev)",
                PackageKind::Rpm => "Install rpm-build (dnf install rpm-build)",
            };
            CheckResult::fail(
                &name,
                &format!("{tool} not found in PATH"),
                Some(suggestion),
                false,
            )
        }
    }
}

/// Problems with the template tree rooted at `template_dir`
pub fn check_templates(template_dir: &Path) -> Vec<String> {
    if !template_dir.is_dir() {
        return vec![format!(
            "Template directory '{}' does not exist",
            template_dir.display()
        )];
    }

    let mut issues = Vec::new();
    for kind in PackageKind::ALL {
        if !template_dir.join(kind.as_str()).is_dir() {
            tracing::debug!("No {kind} templates under {}", template_dir.display());
            continue;
        }
        for package in Package::ALL {
            if let Err(e) = PackageTemplate::load(template_dir, kind, package) {
                issues.push(format!("{kind}/{package}: {e}"));
            }
        }
    }
    issues
}

/// Run all doctor checks
pub fn run_doctor(template_dir: &Path) -> DoctorReport {
    let mut report = DoctorReport::new();
    for kind in PackageKind::ALL {
        report.add_check(check_builder(kind));
    }
    for issue in check_templates(template_dir) {
        report.add_config_issue(issue);
    }
    report
}
