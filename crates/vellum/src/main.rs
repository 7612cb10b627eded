//! Vellum CLI binary.
//!
//! This binary provides command-line access to a Vellum storage:
//! - Store and identify files
//! - Look up metadata and paths, with variant fallbacks
//! - Generate variants with a shell command

use clap::Parser;
use vellum::{LogConfig, init_tracing};

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Parse command-line arguments
    let cli = cli::Cli::parse();

    // Initialize tracing
    let mut log_config = LogConfig::new();
    if cli.verbose {
        log_config = log_config.with_log_level("debug");
    }
    init_tracing(log_config)?;

    cli::run(cli).await?;

    Ok(())
}
