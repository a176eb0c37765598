//! Main build orchestration.
//!
//! This module provides the [`Builder`] that drives one build from a
//! [`BuildRequest`] to a packaged bundle, phase by phase.

use super::{
    checksum::calculate_sha256,
    outcome::{BuildArtifact, BuildFailure, BuildOutcome},
};
use crate::{
    bundler::{
        BuildRequest, Error, Result,
        compiler,
        error::ErrorExt,
        events::{BuildPhase, Reporter},
        interpreter::InterpreterLocator,
        package,
        settings::{ENV_DIR, ProjectLayout},
        utils::fs,
    },
    source::{BuildSource, OutputLocation},
};
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Prefix of every build's temporary work root.
const WORK_ROOT_PREFIX: &str = "pyonedir-";

/// Runs one build.
///
/// The phases run strictly in order:
///
/// 1. **Validate** - resolve the source to a project root
/// 2. **ProvisionEnv** - find an interpreter and create the environment
/// 3. **InstallDeps** - install packaging tools, the bundler and requirements
/// 4. **RunCompiler** - run the bundler
/// 5. **Package** - copy the bundle next to the source and zip it
///
/// Extraction and the environment live under a temporary work root that is
/// removed when the build ends, whatever the outcome.
///
/// # Examples
///
/// ```no_run
/// use pyonedir::bundler::{BuildEvent, BuildRequestBuilder, Builder, Reporter};
///
/// # async fn example() -> pyonedir::bundler::Result<()> {
/// let request = BuildRequestBuilder::new()
///     .source("projects/hello.zip")
///     .hide_console(true)
///     .build()?;
///
/// let (reporter, mut events) = Reporter::channel();
/// let outcome = Builder::new(request).run(&reporter).await;
///
/// while let Ok(event) = events.try_recv() {
///     if let BuildEvent::Log(line) = event {
///         println!("{line}");
///     }
/// }
/// println!("exit code {}", outcome.exit_code());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Builder {
    request: BuildRequest,
    locator: InterpreterLocator,
    cancel: CancellationToken,
}

impl Builder {
    /// Creates a builder that searches for interpreters the usual way, trying
    /// the request's explicit interpreters first.
    pub fn new(request: BuildRequest) -> Self {
        let locator = InterpreterLocator::new(request.interpreters().to_vec());
        Self {
            request,
            locator,
            cancel: CancellationToken::new(),
        }
    }

    /// Replaces the interpreter locator.
    pub fn with_locator(mut self, locator: InterpreterLocator) -> Self {
        self.locator = locator;
        self
    }

    /// Uses `cancel` to stop the build.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Returns a token that cancels this build when triggered.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn request(&self) -> &BuildRequest {
        &self.request
    }

    /// Runs the build and converts any error into a failed outcome carrying
    /// the full build log.
    ///
    /// Does not send [`BuildEvent::Finished`](crate::bundler::BuildEvent::Finished);
    /// that is left to whoever owns the channel.
    pub async fn run(&self, reporter: &Reporter) -> BuildOutcome {
        match self.build(reporter).await {
            Ok(artifact) => {
                log::info!("Build succeeded: {}", artifact.archive.display());
                BuildOutcome::Success(artifact)
            }
            Err(e) => {
                log::error!("Build failed ({}): {}", e.kind(), e);
                reporter.log(format!("Build failed: {e}"));
                BuildOutcome::Failed(BuildFailure::new(&e, reporter.transcript()))
            }
        }
    }

    /// Runs every phase and returns the packaged artifact.
    pub async fn build(&self, reporter: &Reporter) -> Result<BuildArtifact> {
        reporter.phase(BuildPhase::Validate);
        let source = self.request.source();
        reporter.log(format!("Source: {}", source.path().display()));
        let location = source.output_location()?;

        let work = tempfile::Builder::new()
            .prefix(WORK_ROOT_PREFIX)
            .tempdir()
            .fs_context("creating work directory", std::env::temp_dir())?;
        log::debug!("Work root: {}", work.path().display());

        let result = self.build_in(work.path(), &location, reporter).await;

        let work_path = work.path().to_path_buf();
        if let Err(e) = work.close() {
            log::warn!(
                "Failed to clean up work directory {}: {}",
                work_path.display(),
                e
            );
        }

        result
    }

    async fn build_in(
        &self,
        work_root: &Path,
        location: &OutputLocation,
        reporter: &Reporter,
    ) -> Result<BuildArtifact> {
        let project = self.request.source().resolve(work_root).await?;
        let layout = project.layout();
        reporter.log(format!("Project root: {}", layout.root().display()));

        let result = self.provision_and_package(work_root, layout, location, reporter).await;

        // Extracted projects vanish with the work root; a directory source
        // must not keep the bundler's scratch output.
        if let BuildSource::Directory(_) = self.request.source() {
            clean_bundler_output(layout).await;
        }

        result
    }

    async fn provision_and_package(
        &self,
        work_root: &Path,
        layout: &ProjectLayout,
        location: &OutputLocation,
        reporter: &Reporter,
    ) -> Result<BuildArtifact> {
        let cancel = &self.cancel;

        self.checkpoint(reporter, BuildPhase::ProvisionEnv)?;
        let (candidate, env) = self
            .locator
            .locate(&work_root.join(ENV_DIR), reporter, cancel)
            .await?;
        reporter.log(format!("Using interpreter {candidate}"));

        self.checkpoint(reporter, BuildPhase::InstallDeps)?;
        env.install_tooling(reporter, cancel).await?;
        env.install_bundler(reporter, cancel).await?;
        env.install_requirements(layout, reporter, cancel).await?;

        self.checkpoint(reporter, BuildPhase::RunCompiler)?;
        let bundle =
            compiler::compile(layout, &env, self.request.options(), reporter, cancel).await?;

        self.checkpoint(reporter, BuildPhase::Package)?;
        let packaged = package::package(&bundle, location, reporter).await?;
        let archive_size = tokio::fs::metadata(&packaged.archive)
            .await
            .fs_context("reading archive metadata", &packaged.archive)?
            .len();
        let archive_sha256 = calculate_sha256(&packaged.archive).await?;

        reporter.log(format!("Output folder: {}", packaged.dir.display()));
        reporter.log(format!(
            "Archive: {} ({} bytes, sha256 {})",
            packaged.archive.display(),
            archive_size,
            archive_sha256
        ));
        reporter.phase(BuildPhase::Done);

        Ok(BuildArtifact {
            output_dir: packaged.dir,
            archive: packaged.archive,
            archive_size,
            archive_sha256,
            interpreter: candidate.invocation().to_string(),
        })
    }

    /// Stops before `phase` if cancelled, otherwise reports it.
    fn checkpoint(&self, reporter: &Reporter, phase: BuildPhase) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        reporter.phase(phase);
        Ok(())
    }
}

async fn clean_bundler_output(layout: &ProjectLayout) {
    for dir in [layout.dist_dir(), layout.build_dir()] {
        if let Err(e) = fs::remove_dir_all(&dir).await {
            log::warn!("Failed to clean up {}: {}", dir.display(), e);
        }
    }
}
