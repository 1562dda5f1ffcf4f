//! kubepkg CLI - native packages for Kubernetes components
//!
//! Entry point for the kubepkg command-line application.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use kubepkg::cli::output::display_error;
use kubepkg::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let output = cli.output_config();

    // RUST_LOG wins over -v/-q
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("kubepkg={}", output.log_level())));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cli.run().await {
        display_error(&e);
        std::process::exit(1);
    }
}
