//! Common test utilities and helpers
//!
//! Shared fixtures for integration tests: a temporary workspace with a
//! template tree for every package.

#![allow(dead_code)]

use std::path::PathBuf;
use tempfile::TempDir;

use kubepkg::core::kind::PackageKind;
use kubepkg::core::package::Package;

/// Test workspace
///
/// Holds a temporary directory with `templates/` and `bin/` inside.
pub struct TestProject {
    /// Temporary directory for the test workspace
    pub dir: TempDir,
}

impl TestProject {
    /// Create a new, empty workspace
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Create a workspace with templates for every package of both kinds
    pub fn with_templates() -> Self {
        let project = Self::new();
        for kind in PackageKind::ALL {
            project.write_templates(kind);
        }
        project
    }

    /// Get the path to the workspace
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Root of the template tree
    pub fn template_dir(&self) -> PathBuf {
        self.dir.path().join("templates")
    }

    /// Root of the build output
    pub fn output_dir(&self) -> PathBuf {
        self.dir.path().join("bin")
    }

    /// Create a file in the workspace
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Check if a file exists in the workspace
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// Read a file from the workspace
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).expect("Failed to read file")
    }

    /// Write the sample template for every package of `kind`
    pub fn write_templates(&self, kind: PackageKind) {
        for package in Package::ALL {
            let root = format!("templates/{kind}/{package}");
            match kind {
                PackageKind::Deb => {
                    self.create_file(&format!("{root}/debian/control.tmpl"), SAMPLE_CONTROL);
                    self.create_file(&format!("{root}/debian/changelog"), SAMPLE_CHANGELOG);
                    self.create_file(&format!("{root}/debian/rules"), SAMPLE_RULES);
                    make_executable(&self.dir.path().join(format!("{root}/debian/rules")));
                }
                PackageKind::Rpm => {
                    self.create_file(&format!("{root}/SPECS/{package}.spec"), SAMPLE_SPEC);
                }
            }
        }
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
fn make_executable(path: &std::path::Path) {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .expect("Failed to set permissions");
}

#[cfg(not(unix))]
fn make_executable(_path: &std::path::Path) {}

/// Sample Debian control file
pub const SAMPLE_CONTROL: &str = "\
Source: {{ .Name }}
Maintainer: Kubernetes Authors <kubernetes-dev@googlegroups.com>

Package: {{ .Name }}
Architecture: {{ .Arch }}
Depends: kubernetes-cni (>= {{ .KubeletCNIVersion }})
Description: {{ .Name }} {{ .Version }} from the {{ .Channel }} channel
";

/// Sample Debian changelog
pub const SAMPLE_CHANGELOG: &str = "\
{{ .Name }} ({{ .Version }}-{{ .Revision }}) kubernetes-xenial; urgency=low

  * Kubernetes {{ .KubernetesVersion }}

 -- Kubernetes Authors <kubernetes-dev@googlegroups.com>  Thu, 01 Jan 1970 00:00:00 +0000
";

/// Sample Debian rules file
pub const SAMPLE_RULES: &str = "\
#!/usr/bin/make -f
# fetched from {{ .DownloadLinkBase }}/bin/linux/{{ .GoArch }}/{{ .Name }}
%:
\tdh $@
";

/// Sample RPM spec file
pub const SAMPLE_SPEC: &str = "\
Name: {{ .Name }}
Version: {{ .Version }}
Release: {{ .Revision }}
Source0: {{ .CNIDownloadLink }}
Source1: {{ .CRIToolsDownloadLink }}
BuildArch: {{ .Arch }}
";

/// Sample global config
pub const SAMPLE_CONFIG: &str = r#"
[build]
revision = "9"
architectures = ["arm64"]
"#;
