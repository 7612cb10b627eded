//! CLI command definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Vellum - sharded local file storage with derived variants
#[derive(Parser, Debug)]
#[command(name = "vellum")]
#[command(about = "Sharded local file storage with derived variants", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to ~/.config/vellum/vellum.toml and ./vellum.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Storage root, overriding the configuration
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store a file and print its id
    Save {
        /// File to store
        file: PathBuf,

        /// Name to use instead of a random UUID
        #[arg(long)]
        name: Option<String>,

        /// Extra metadata field (KEY=VALUE, VALUE parsed as JSON when possible)
        #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        fields: Vec<(String, String)>,
    },

    /// Print the detected format, media type and size of a file without storing it
    Identify {
        /// File to identify
        file: PathBuf,
    },

    /// Print the metadata document of a stored file
    Metadata {
        /// File id
        id: String,
    },

    /// Print the path of a stored file or one of its variants
    Path {
        /// File id
        id: String,

        /// Variant to look up instead of the original
        #[arg(long)]
        variant: Option<String>,

        /// Fallbacks tried in order (`original` for the original file)
        #[arg(long)]
        fallback: Vec<String>,
    },

    /// Delete a stored file with its metadata and variants
    Delete {
        /// File id
        id: String,
    },

    /// Generate the configured variants of one file
    Generate {
        /// File id
        id: String,

        /// Shell command producing one variant
        #[arg(long)]
        command: String,

        /// Remove existing variants first
        #[arg(long)]
        clean: bool,
    },

    /// Regenerate the configured variants of every stored file
    GenerateAll {
        /// Shell command producing one variant
        #[arg(long)]
        command: String,

        /// Remove existing variants first
        #[arg(long)]
        clean: bool,
    },
}

fn parse_key_value(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", arg)),
    }
}
