//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Required environment variables are absent or blank
    #[error("Missing environment variables: {}", variables.join(", "))]
    MissingEnvironment {
        /// Variable names
        variables: Vec<String>,
    },

    /// One or more cases failed
    #[error("{failed} of {total} cases failed")]
    CasesFailed {
        /// Failed cases
        failed: usize,
        /// Cases in the report
        total: usize,
    },

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON rendering error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Shopwright library error
    #[error("Shopwright error: {0}")]
    Shop(#[from] shopwright::ShopError),
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Process exit status: 1 for failing cases, 2 for anything that kept
    /// the suite from running
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::CasesFailed { .. } => 1,
            _ => 2,
        }
    }
}
