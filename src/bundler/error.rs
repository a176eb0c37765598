//! Error types for the build pipeline.
//!
//! Every failure the pipeline can surface maps onto one [`ErrorKind`], which
//! front-ends use to classify a failed build without matching on messages.

use serde::Serialize;
use std::{
    fmt::Display,
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while resolving, provisioning, compiling or packaging.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// An archive entry would escape the extraction directory.
    #[error("unsafe archive entry `{entry}`: entries must stay inside the extraction directory")]
    PathTraversal {
        /// Entry name as stored in the archive.
        entry: String,
    },

    /// The project has no entry-point file after root detection.
    #[error("required entry point `{entry_point}` not found in {}", root.display())]
    MissingEntrypoint {
        /// Resolved project root.
        root: PathBuf,
        /// Name of the missing file.
        entry_point: String,
    },

    /// The source path is neither an existing directory nor a zip archive.
    #[error("invalid build source {}: {reason}", path.display())]
    InvalidSource {
        /// Source path as given.
        path: PathBuf,
        /// Why it was rejected.
        reason: String,
    },

    /// Every interpreter candidate failed probing or environment creation.
    #[error("no usable Python interpreter found ({} candidate(s) tried)", attempts.len())]
    InterpreterNotFound {
        /// One line per attempted candidate, in the order they were tried.
        attempts: Vec<String>,
    },

    /// One candidate could not create an isolated environment.
    #[error("failed to create environment at {} with {interpreter}: {reason}", path.display())]
    EnvironmentCreationFailed {
        /// Interpreter invocation that was used.
        interpreter: String,
        /// Target environment directory.
        path: PathBuf,
        /// Exit status or spawn error.
        reason: String,
    },

    /// Installing the bundler or the project's requirements failed.
    #[error("dependency installation failed: `{command}` {status}")]
    DependencyInstallFailed {
        /// Command line that failed.
        command: String,
        /// Exit status description.
        status: String,
    },

    /// The bundler exited non-zero.
    #[error("bundler failed: `{command}` {status}; see the build log for details")]
    CompilerError {
        /// Command line that failed.
        command: String,
        /// Exit status description.
        status: String,
    },

    /// The bundler succeeded but its one-directory output is missing.
    #[error("bundler output not found in {}: {reason}", dist_dir.display())]
    ArtifactNotFound {
        /// Bundler output directory that was searched.
        dist_dir: PathBuf,
        /// What was found instead.
        reason: String,
    },

    /// The build was cancelled by the caller.
    #[error("build cancelled")]
    Cancelled,

    /// A subprocess could not be started or awaited.
    #[error("failed to run `{command}`: {error}")]
    CommandFailed {
        /// Command line.
        command: String,
        /// Underlying error.
        #[source]
        error: io::Error,
    },

    /// Filesystem error with the operation and path that caused it.
    #[error("{context} {}: {error}", path.display())]
    Fs {
        /// Operation being performed.
        context: String,
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        error: io::Error,
    },

    /// IO errors
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    /// Zip archive errors
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Directory traversal errors
    #[error("directory walk error: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// Path prefix errors
    #[error(transparent)]
    StripPrefix(#[from] std::path::StripPrefixError),

    /// Anything else, with a message.
    #[error("{0}")]
    GenericError(String),
}

/// Classification of a failed build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    PathTraversal,
    MissingEntrypoint,
    InvalidSource,
    InterpreterNotFound,
    EnvironmentCreationFailed,
    DependencyInstallFailed,
    CompilerError,
    ArtifactNotFound,
    Cancelled,
    Io,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::PathTraversal => "path traversal",
            Self::MissingEntrypoint => "missing entry point",
            Self::InvalidSource => "invalid source",
            Self::InterpreterNotFound => "interpreter not found",
            Self::EnvironmentCreationFailed => "environment creation failed",
            Self::DependencyInstallFailed => "dependency install failed",
            Self::CompilerError => "compiler error",
            Self::ArtifactNotFound => "artifact not found",
            Self::Cancelled => "cancelled",
            Self::Io => "io",
        };
        f.write_str(name)
    }
}

impl Error {
    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PathTraversal { .. } => ErrorKind::PathTraversal,
            Self::MissingEntrypoint { .. } => ErrorKind::MissingEntrypoint,
            Self::InvalidSource { .. } => ErrorKind::InvalidSource,
            Self::InterpreterNotFound { .. } => ErrorKind::InterpreterNotFound,
            Self::EnvironmentCreationFailed { .. } => ErrorKind::EnvironmentCreationFailed,
            Self::DependencyInstallFailed { .. } => ErrorKind::DependencyInstallFailed,
            Self::CompilerError { .. } => ErrorKind::CompilerError,
            Self::ArtifactNotFound { .. } => ErrorKind::ArtifactNotFound,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::CommandFailed { .. }
            | Self::Fs { .. }
            | Self::IoError(_)
            | Self::Zip(_)
            | Self::WalkDir(_)
            | Self::StripPrefix(_)
            | Self::GenericError(_) => ErrorKind::Io,
        }
    }
}

/// Attaches the failing operation and path to filesystem errors.
pub trait ErrorExt<T> {
    fn fs_context(self, context: &str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, io::Error> {
    fn fs_context(self, context: &str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context: context.to_string(),
            path: path.as_ref().to_path_buf(),
            error,
        })
    }
}

/// Turns a missing value into an [`Error::GenericError`] with a message.
pub trait Context<T> {
    fn context<C: Display>(self, context: C) -> Result<T>;
}

impl<T> Context<T> for Option<T> {
    fn context<C: Display>(self, context: C) -> Result<T> {
        self.ok_or_else(|| Error::GenericError(context.to_string()))
    }
}

/// Returns early with an [`Error::GenericError`] built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::bundler::Error::GenericError(format!($($arg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_like_errors_classify_as_io() {
        let err: Error = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.kind(), ErrorKind::Io);

        let err = Error::GenericError("boom".into());
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn fs_context_keeps_path_in_message() {
        let res: std::result::Result<(), io::Error> =
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        let err = res.fs_context("removing", "/tmp/x").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("removing"));
        assert!(msg.contains("/tmp/x"));
    }

    #[test]
    fn interpreter_not_found_counts_attempts() {
        let err = Error::InterpreterNotFound {
            attempts: vec!["a".into(), "b".into()],
        };
        assert_eq!(err.to_string(), "no usable Python interpreter found (2 candidate(s) tried)");
    }
}
