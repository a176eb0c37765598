//! Terminal results of a build.

use crate::bundler::{Error, ErrorKind};
use serde::Serialize;
use std::path::PathBuf;

/// Outputs of a successful build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildArtifact {
    /// Copied one-directory bundle (`<base>_onedir`).
    pub output_dir: PathBuf,
    /// Zipped bundle (`<base>_onedir.zip`).
    pub archive: PathBuf,
    /// Archive size in bytes.
    pub archive_size: u64,
    /// Hex-encoded SHA-256 of the archive.
    pub archive_sha256: String,
    /// Interpreter that created the build environment.
    pub interpreter: String,
}

/// Why a build failed, with everything it logged up to that point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildFailure {
    pub kind: ErrorKind,
    pub message: String,
    pub log: Vec<String>,
}

impl BuildFailure {
    pub fn new(error: &Error, log: Vec<String>) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
            log,
        }
    }
}

/// Result of one build: exactly one of success or failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BuildOutcome {
    Success(BuildArtifact),
    Failed(BuildFailure),
}

impl BuildOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn artifact(&self) -> Option<&BuildArtifact> {
        match self {
            Self::Success(artifact) => Some(artifact),
            Self::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&BuildFailure> {
        match self {
            Self::Success(_) => None,
            Self::Failed(failure) => Some(failure),
        }
    }

    /// Process exit code for this outcome: 0, 1, or 130 when cancelled.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Success(_) => 0,
            Self::Failed(failure) if failure.kind == ErrorKind::Cancelled => 130,
            Self::Failed(_) => 1,
        }
    }
}
