//! CLI command definitions and parsing
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "blobsift",
    version,
    author = "neur0map",
    about = "Extract and contextualize network artifacts from text blobs",
    long_about = "blobsift pulls IPv4 addresses, email addresses, URLs and hostnames out of \
                  unstructured text such as a suspicious email's source, drops duplicates and \
                  whitelisted values, and tags IPs with country, named-network and blacklist context."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/blobsift/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract artifacts from a file or stdin
    Sift {
        /// Input file; reads stdin when omitted or "-"
        input: Option<PathBuf>,

        /// Treat the input as binary and sift only its printable strings
        #[arg(short, long)]
        strings: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Check that all lookup files are present
    Preflight,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// `{"data": [...]}` envelope
    Json,
    /// One artifact per line: type, value, tags
    Text,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
