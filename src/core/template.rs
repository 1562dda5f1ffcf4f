//! Package templates
//!
//! Templates live at `<template_dir>/<kind>/<package>/`. The whole tree is
//! copied into a build directory with `{{ .Variable }}` placeholders filled
//! in. An optional `template.toml` at the root describes the template and is
//! not copied.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use walkdir::WalkDir;

use crate::core::kind::{Architecture, PackageKind};
use crate::core::package::Package;
use crate::error::FilesystemError;
use crate::infra::filesystem;

/// Template metadata file name
pub const METADATA_FILE: &str = "template.toml";

/// Suffix stripped from rendered file names
const TEMPLATE_SUFFIX: &str = ".tmpl";

/// Template loading and rendering errors
#[derive(Error, Debug)]
pub enum TemplateError {
    /// No template directory for the package
    #[error("Template directory '{path}' does not exist")]
    NotFound { path: PathBuf },

    /// `template.toml` could not be parsed
    #[error("Invalid template metadata '{path}': {error}")]
    InvalidMetadata { path: PathBuf, error: String },

    /// A placeholder names a variable we do not provide
    #[error("Unknown template variable '{name}' in '{file}'")]
    UnknownVariable { file: PathBuf, name: String },

    /// A `{{ ... }}` directive other than a plain `{{ .Name }}` lookup
    #[error("Unsupported template directive '{directive}' in '{file}'")]
    UnsupportedSyntax { file: PathBuf, directive: String },

    /// Walking the template tree failed
    #[error("Failed to read template tree '{path}': {error}")]
    Walk { path: PathBuf, error: String },

    /// The build manifest could not be serialized
    #[error("Failed to write build manifest: {error}")]
    Manifest { error: String },

    /// Filesystem error while rendering
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
}

/// Contents of `template.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateMetadata {
    /// Human readable summary
    #[serde(default)]
    pub description: Option<String>,

    /// Architectures the template supports (empty = all)
    #[serde(default)]
    pub arch: Vec<Architecture>,
}

impl TemplateMetadata {
    /// Whether the template can be built for `arch`
    pub fn supports(&self, arch: Architecture) -> bool {
        self.arch.is_empty() || self.arch.contains(&arch)
    }

    /// Comma separated supported architectures, or `all`
    pub fn supported_list(&self) -> String {
        if self.arch.is_empty() {
            return "all".to_string();
        }
        self.arch
            .iter()
            .map(|a| a.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A located template tree with its metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageTemplate {
    /// Root of the template tree
    pub dir: PathBuf,
    /// Parsed `template.toml`, or defaults when absent
    pub metadata: TemplateMetadata,
}

impl PackageTemplate {
    /// Directory holding the template for `package` of `kind`
    pub fn path_for(template_dir: &Path, kind: PackageKind, package: Package) -> PathBuf {
        template_dir.join(kind.as_str()).join(package.as_str())
    }

    /// Locate the template and read its metadata
    pub fn load(
        template_dir: &Path,
        kind: PackageKind,
        package: Package,
    ) -> Result<Self, TemplateError> {
        let dir = Self::path_for(template_dir, kind, package);
        if !dir.is_dir() {
            return Err(TemplateError::NotFound { path: dir });
        }

        let metadata_path = dir.join(METADATA_FILE);
        let metadata = if metadata_path.is_file() {
            let content = filesystem::read_file(&metadata_path)?;
            toml::from_str(&content).map_err(|e| TemplateError::InvalidMetadata {
                path: metadata_path.clone(),
                error: e.to_string(),
            })?
        } else {
            TemplateMetadata::default()
        };

        tracing::debug!("Loaded {kind} template for {package} from {}", dir.display());
        Ok(Self { dir, metadata })
    }

    /// Render the template tree into `dest`
    ///
    /// `dest` is wiped first, so rendering the same template with the same
    /// variables always yields the same tree. Returns the written files,
    /// relative to `dest`, in walk order.
    pub fn render(&self, vars: &TemplateVars, dest: &Path) -> Result<Vec<PathBuf>, TemplateError> {
        filesystem::remove_dir_all(dest)?;
        filesystem::create_dir_all(dest)?;

        let mut written = Vec::new();
        let walker = WalkDir::new(&self.dir)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter();

        for entry in walker {
            let entry = entry.map_err(|e| TemplateError::Walk {
                path: self.dir.clone(),
                error: e.to_string(),
            })?;
            let relative = entry
                .path()
                .strip_prefix(&self.dir)
                .map_err(|e| TemplateError::Walk {
                    path: entry.path().to_path_buf(),
                    error: e.to_string(),
                })?;

            if relative == Path::new(METADATA_FILE) {
                continue;
            }

            if entry.file_type().is_dir() {
                filesystem::create_dir_all(&dest.join(relative))?;
                continue;
            }

            let output_relative = strip_template_suffix(relative);
            let output = dest.join(&output_relative);
            let bytes = filesystem::read_bytes(entry.path())?;
            match String::from_utf8(bytes) {
                Ok(text) => {
                    let rendered = vars.render_str(&text, relative)?;
                    filesystem::write_file(&output, rendered)?;
                }
                Err(raw) => filesystem::write_file(&output, raw.into_bytes())?,
            }
            filesystem::copy_permissions(entry.path(), &output)?;
            written.push(output_relative);
        }

        tracing::debug!(
            "Rendered {} files from {} into {}",
            written.len(),
            self.dir.display(),
            dest.display()
        );
        Ok(written)
    }
}

fn strip_template_suffix(path: &Path) -> PathBuf {
    match path.to_str().and_then(|s| s.strip_suffix(TEMPLATE_SUFFIX)) {
        Some(stripped) if !stripped.is_empty() => PathBuf::from(stripped),
        _ => path.to_path_buf(),
    }
}

fn directive() -> &'static Regex {
    static DIRECTIVE: OnceLock<Regex> = OnceLock::new();
    DIRECTIVE.get_or_init(|| Regex::new(r"(?s)\{\{(.*?)\}\}").expect("directive regex is valid"))
}

fn variable() -> &'static Regex {
    static VARIABLE: OnceLock<Regex> = OnceLock::new();
    VARIABLE.get_or_init(|| {
        Regex::new(r"^\s*\.([A-Za-z][A-Za-z0-9_]*)\s*$").expect("variable regex is valid")
    })
}

/// Variables available to templates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TemplateVars(BTreeMap<String, String>);

impl TemplateVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable, replacing any previous value
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.0.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Substitute placeholders in `content`
    ///
    /// Every `{{ ... }}` must be a `{{ .Name }}` lookup of a known variable.
    /// `file` is only used for error messages.
    pub fn render_str(&self, content: &str, file: &Path) -> Result<String, TemplateError> {
        let mut rendered = String::with_capacity(content.len());
        let mut last = 0;
        for caps in directive().captures_iter(content) {
            let (Some(whole), Some(body)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let name = variable()
                .captures(body.as_str())
                .and_then(|c| c.get(1))
                .ok_or_else(|| TemplateError::UnsupportedSyntax {
                    file: file.to_path_buf(),
                    directive: whole.as_str().to_string(),
                })?;
            let value = self
                .get(name.as_str())
                .ok_or_else(|| TemplateError::UnknownVariable {
                    file: file.to_path_buf(),
                    name: name.as_str().to_string(),
                })?;
            rendered.push_str(&content[last..whole.start()]);
            rendered.push_str(value);
            last = whole.end();
        }
        rendered.push_str(&content[last..]);
        Ok(rendered)
    }
}
