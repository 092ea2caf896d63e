//! CLI-specific error types
//!
//! All CLI errors are fatal: the process prints the error and exits non-zero.

use std::io;

use thiserror::Error;

use crate::backend::BackendError;
use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("TABLEGATE_CLI_CONFIG_ERROR: {0}")]
    Config(#[from] ConfigError),

    #[error("TABLEGATE_CLI_BOOT_FAILED: {0}")]
    Backend(#[from] BackendError),

    #[error("TABLEGATE_CLI_IO_ERROR: {0}")]
    Io(#[from] io::Error),

    #[error("TABLEGATE_CLI_IO_ERROR: JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        match self {
            CliError::Config(_) => "TABLEGATE_CLI_CONFIG_ERROR",
            CliError::Backend(_) => "TABLEGATE_CLI_BOOT_FAILED",
            CliError::Io(_) | CliError::Json(_) => "TABLEGATE_CLI_IO_ERROR",
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_code() {
        let err = CliError::from(ConfigError::Missing("INTERNAL_API_KEY"));
        assert_eq!(err.code_str(), "TABLEGATE_CLI_CONFIG_ERROR");
        assert_eq!(
            err.to_string(),
            "TABLEGATE_CLI_CONFIG_ERROR: Missing required setting: INTERNAL_API_KEY"
        );
    }
}
