//! CLI module for tablegate
//!
//! Provides command-line interface for:
//! - serve: Boot the gateway and serve until signalled
//! - check-config: Validate configuration and print a summary

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check_config, load_config, run, run_command, serve};
pub use errors::{CliError, CliResult};
pub use io::{write_json, write_json_to};
