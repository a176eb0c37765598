//! Front-end error types.
//!
//! Pipeline failures travel inside a build outcome; these types cover what
//! can go wrong around a build, such as bad arguments or terminal output.

use thiserror::Error;

/// Result type alias for front-end operations
pub type Result<T> = std::result::Result<T, BundlerError>;

/// Main error type for the command-line front-end
#[derive(Error, Debug)]
pub enum BundlerError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Bundler errors
    #[error("Bundler error: {0}")]
    Bundler(#[from] crate::bundler::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },
}

impl BundlerError {
    /// Short hint printed under the error, if there is one.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Cli(_) => Some("Run `pyonedir --help` for usage."),
            Self::Bundler(e) => match e.kind() {
                crate::bundler::ErrorKind::InvalidSource => {
                    Some("SOURCE must be a project directory or a .zip archive.")
                }
                _ => None,
            },
            _ => None,
        }
    }
}
