//! Output formatting and progress indicators
//!
//! [`OutputConfig`] carries the quiet/json/verbose flags and is handed to
//! every command; nothing here is global.

use indicatif::{ProgressBar, ProgressStyle};

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";

    /// Warning prefix (yellow triangle)
    pub const WARNING: &str = "⚠";

    /// Info prefix (blue circle)
    pub const INFO: &str = "ℹ";
}

/// Output preferences for one invocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputConfig {
    /// Only errors are printed
    pub quiet: bool,
    /// Machine readable output on stdout
    pub json: bool,
    /// Verbosity level (0 = normal, 1 = info, 2+ = debug)
    pub verbose: u8,
}

impl OutputConfig {
    pub fn new(quiet: bool, json: bool, verbose: u8) -> Self {
        Self {
            quiet,
            json,
            verbose,
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    /// Whether human readable progress should be printed
    pub fn is_interactive(&self) -> bool {
        !self.quiet && !self.json
    }

    /// Default log filter for this verbosity
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }

    pub fn print_info(&self, message: &str) {
        if self.is_interactive() {
            println!("{} {message}", status::INFO);
        }
    }

    pub fn print_success(&self, message: &str) {
        if self.is_interactive() {
            println!("{} {message}", status::SUCCESS);
        }
    }

    /// Warnings go to stderr so they survive `--json`
    pub fn print_warning(&self, message: &str) {
        if !self.quiet {
            eprintln!("{} {message}", status::WARNING);
        }
    }

    pub fn print_detail(&self, message: &str) {
        if self.is_interactive() {
            println!("    {message}");
        }
    }

    /// Progress bar over `total` package builds, unless output is suppressed
    pub fn build_bar(&self, total: u64) -> Option<ProgressBar> {
        self.is_interactive().then(|| create_build_bar(total))
    }
}

/// Create a progress bar for package builds
pub fn create_build_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} packages ({msg})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░"),
    );
    pb
}

/// Print an error and its causes to stderr
pub fn display_error(error: &anyhow::Error) {
    eprintln!("{} Error: {error}", status::ERROR);
    for cause in error.chain().skip(1) {
        eprintln!("  Caused by: {cause}");
    }
}
