//! CLI argument definitions using clap
//!
//! Commands:
//! - tablegate serve [--config <path>] [--host <host>] [--port <port>]
//! - tablegate check-config [--config <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::observability::LogFormat;

/// tablegate - read-only, key-gated HTTP access to database tables
#[derive(Parser, Debug)]
#[command(name = "tablegate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the gateway
    Serve {
        /// Optional JSON configuration file; environment variables override it
        #[arg(long)]
        config: Option<PathBuf>,

        /// Bind host, overrides configuration
        #[arg(long)]
        host: Option<String>,

        /// Bind port, overrides configuration
        #[arg(long)]
        port: Option<u16>,

        /// Log output format: json or pretty
        #[arg(long)]
        log_format: Option<LogFormat>,
    },

    /// Load and validate configuration, print a summary and exit
    CheckConfig {
        /// Optional JSON configuration file; environment variables override it
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
