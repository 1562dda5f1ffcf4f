//! Integration tests for the kubepkg binary
//!
//! Every run pins `--kube-version` so no release marker is fetched, and
//! points the config directory at the test workspace.

mod common;

use common::{TestProject, SAMPLE_CONFIG};
use std::process::{Command, Output};

/// Run kubepkg with an isolated config directory
fn run_kubepkg(project: &TestProject, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_kubepkg"))
        .current_dir(project.path())
        .env("KUBEPKG_CONFIG_DIR", project.path().join("config"))
        .env_remove("KUBEPKG_TEMPLATE_DIR")
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("Failed to execute kubepkg")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

const PINNED: &[&str] = &["--template-dir", "templates", "--kube-version", "1.19.2"];

/// Append the pinned flags, plus `--output-dir` for commands that walk
fn with_pinned<'a>(args: &[&'a str]) -> Vec<&'a str> {
    let mut all = args.to_vec();
    all.extend_from_slice(PINNED);
    if matches!(args.first(), Some(&"debs" | &"rpms")) {
        all.extend_from_slice(&["--output-dir", "bin"]);
    }
    all
}

#[test]
fn test_debs_spec_only_renders_without_builders() {
    let project = TestProject::with_templates();
    let output = run_kubepkg(
        &project,
        &with_pinned(&[
            "debs",
            "--spec-only",
            "--arch",
            "amd64,arm",
            "--channels",
            "stable",
            "--packages",
            "kubelet,kubeadm",
        ]),
    );

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(project.file_exists("bin/deb/stable/amd64/kubelet/src/debian/control"));
    assert!(project.file_exists("bin/deb/stable/arm/kubeadm/buildspec.json"));
    let control = project.read_file("bin/deb/stable/arm/kubelet/src/debian/control");
    assert!(control.contains("Architecture: armhf"));
}

#[test]
fn test_rpms_spec_only_uses_rpm_names() {
    let project = TestProject::with_templates();
    let output = run_kubepkg(
        &project,
        &with_pinned(&[
            "rpms",
            "--spec-only",
            "--arch",
            "arm64",
            "--channels",
            "nightly",
            "--packages",
            "cri-tools",
        ]),
    );

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let spec = project.read_file("bin/rpm/nightly/arm64/cri-tools/src/SPECS/cri-tools.spec");
    assert!(spec.contains("Version: 1.19.0"));
    assert!(spec.contains("BuildArch: aarch64"));
}

#[test]
fn test_plan_json_lists_sorted_builds() {
    let project = TestProject::with_templates();
    let output = run_kubepkg(
        &project,
        &with_pinned(&[
            "plan",
            "--json",
            "--kind",
            "rpm",
            "--channels",
            "nightly,stable",
            "--packages",
            "kubelet",
        ]),
    );

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["kind"], "rpm");
    let builds = json["builds"].as_array().unwrap();
    assert_eq!(builds.len(), 2);
    assert_eq!(builds[0]["channel"], "stable");
    assert_eq!(builds[1]["channel"], "nightly");
    assert_eq!(builds[0]["version"], "1.19.2");
    assert!(!project.file_exists("bin"));
}

#[test]
fn test_config_file_supplies_defaults() {
    let project = TestProject::with_templates();
    project.create_file("config/config.toml", SAMPLE_CONFIG);

    let output = run_kubepkg(
        &project,
        &with_pinned(&[
            "debs",
            "--spec-only",
            "--channels",
            "stable",
            "--packages",
            "kubectl",
        ]),
    );

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let changelog = project.read_file("bin/deb/stable/arm64/kubectl/src/debian/changelog");
    assert!(changelog.contains("kubectl (1.19.2-9)"));
    assert!(!project.file_exists("bin/deb/stable/amd64"));
}

#[test]
fn test_invalid_config_file_fails() {
    let project = TestProject::with_templates();
    project.create_file("config/config.toml", "[build\n");

    let output = run_kubepkg(&project, &with_pinned(&["plan"]));
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Failed to load configuration"));
}

#[test]
fn test_missing_template_dir_fails_validation() {
    let project = TestProject::new();
    let output = run_kubepkg(&project, &with_pinned(&["debs", "--spec-only"]));

    assert_eq!(output.status.code(), Some(1));
    let stderr = stderr(&output);
    assert!(stderr.contains("Invalid options"));
    assert!(stderr.contains("Template directory"));
}

#[test]
fn test_unknown_channel_fails_before_building() {
    let project = TestProject::with_templates();
    let output = run_kubepkg(
        &project,
        &with_pinned(&["debs", "--spec-only", "--channels", "beta"]),
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Unknown channel 'beta'"));
    assert!(!project.file_exists("bin"));
}

#[test]
fn test_partial_failure_exits_nonzero_but_keeps_results() {
    let project = TestProject::with_templates();
    project.create_file("templates/deb/kubelet/template.toml", "arch = [\"amd64\"]\n");

    let output = run_kubepkg(
        &project,
        &with_pinned(&[
            "debs",
            "--spec-only",
            "--arch",
            "amd64,s390x",
            "--channels",
            "stable",
            "--packages",
            "kubelet",
        ]),
    );

    assert_eq!(output.status.code(), Some(1));
    let stderr = stderr(&output);
    assert!(stderr.contains("1 of 2 package builds failed"));
    assert!(stderr.contains("kubelet/stable/s390x (deb)"));
    assert!(project.file_exists("bin/deb/stable/amd64/kubelet/src/debian/rules"));
}

#[test]
fn test_plan_rejects_spec_only() {
    let project = TestProject::with_templates();
    let output = run_kubepkg(&project, &with_pinned(&["plan", "--spec-only"]));

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("--spec-only"));
    assert!(!project.file_exists("bin"));
}

#[test]
fn test_doctor_reports_template_problems() {
    let project = TestProject::new();
    project.create_file("templates/deb/kubelet/debian/control", "Package: kubelet\n");

    let output = run_kubepkg(&project, &["doctor", "--json", "--template-dir", "templates"]);
    assert_eq!(output.status.code(), Some(1));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["status"], "error");
    assert_eq!(json["config_issues"].as_array().unwrap().len(), 4);
    assert_eq!(json["checks"].as_array().unwrap().len(), 2);
}

#[test]
fn test_doctor_accepts_complete_templates() {
    let project = TestProject::with_templates();
    let output = run_kubepkg(&project, &["doctor", "--template-dir", "templates"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
}
