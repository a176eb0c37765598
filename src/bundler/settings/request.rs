//! The immutable description of one build.

use super::BuildOptions;
use crate::source::BuildSource;
use std::path::PathBuf;

/// Everything a build needs from its caller.
///
/// Constructed through [`BuildRequestBuilder`](super::BuildRequestBuilder) and
/// never modified once the build starts.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    source: BuildSource,
    options: BuildOptions,
    interpreters: Vec<PathBuf>,
}

impl BuildRequest {
    pub(super) fn new(
        source: BuildSource,
        options: BuildOptions,
        interpreters: Vec<PathBuf>,
    ) -> Self {
        Self {
            source,
            options,
            interpreters,
        }
    }

    /// Returns the archive or directory being built.
    pub fn source(&self) -> &BuildSource {
        &self.source
    }

    /// Returns the bundler options.
    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Returns interpreters the user asked to try before any discovered one.
    pub fn interpreters(&self) -> &[PathBuf] {
        &self.interpreters
    }
}
