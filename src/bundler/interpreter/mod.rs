//! Python interpreter discovery.
//!
//! The locator walks candidate sources in priority order, probes each
//! candidate, and hands the first that answers to the environment
//! provisioner. A candidate is only selected once it has produced a working
//! isolated environment; anything short of that moves on to the next one.
//!
//! # Module Organization
//!
//! - [`candidates`] - candidate sources and discovery
//! - [`launcher`] - Windows `py` launcher support

mod candidates;
mod launcher;

pub use candidates::{
    CandidateSource, InterpreterCandidate, discover, is_python_binary, search_names,
};
pub use launcher::{LauncherEntry, parse_listing};

use super::{
    environment::{self, BuildEnvironment},
    error::{Error, Result},
    events::Reporter,
    process::probe_version,
    settings::PROBE_TIMEOUT,
};
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    time::Duration,
};
use tokio_util::sync::CancellationToken;

/// Finds an interpreter able to create the build environment.
#[derive(Debug, Clone)]
pub struct InterpreterLocator {
    fixed: Vec<InterpreterCandidate>,
    sources: Vec<CandidateSource>,
    explicit: Vec<PathBuf>,
    probe_timeout: Duration,
}

impl Default for InterpreterLocator {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl InterpreterLocator {
    /// Searches every source, trying `explicit` interpreters first.
    pub fn new(explicit: Vec<PathBuf>) -> Self {
        Self {
            fixed: Vec::new(),
            sources: CandidateSource::ALL.to_vec(),
            explicit,
            probe_timeout: PROBE_TIMEOUT,
        }
    }

    /// Tries exactly `candidates`, in order, and nothing else.
    pub fn with_candidates(candidates: Vec<InterpreterCandidate>) -> Self {
        Self {
            fixed: candidates,
            sources: Vec::new(),
            explicit: Vec::new(),
            probe_timeout: PROBE_TIMEOUT,
        }
    }

    /// Overrides the per-candidate probe timeout.
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Returns the first candidate that probes and provisions `env_dir`.
    ///
    /// # Errors
    ///
    /// - [`Error::InterpreterNotFound`] once every candidate has failed; the
    ///   remediation advice has already been logged by then
    /// - [`Error::Cancelled`] when `cancel` fires
    /// - any filesystem error from preparing `env_dir`
    pub async fn locate(
        &self,
        env_dir: &Path,
        reporter: &Reporter,
        cancel: &CancellationToken,
    ) -> Result<(InterpreterCandidate, BuildEnvironment)> {
        let mut seen = HashSet::new();
        let mut attempts = Vec::new();

        let mut fixed = Some(self.fixed.clone());
        let mut sources = self.sources.iter();

        loop {
            // Sources are only consulted once everything before them failed.
            let group = if let Some(group) = fixed.take() {
                group
            } else if let Some(source) = sources.next() {
                discover(*source, &self.explicit).await
            } else {
                break;
            };

            for candidate in group {
                if !seen.insert(candidate.invocation().signature()) {
                    log::debug!("Skipping duplicate candidate {}", candidate);
                    continue;
                }
                if cancel.is_cancelled() {
                    return Err(Error::Cancelled);
                }

                reporter.log(format!("Trying interpreter {candidate}"));
                let probed = probe_version(candidate.invocation(), self.probe_timeout).await;
                let version = match probed {
                    Ok(version) => version,
                    Err(reason) => {
                        reporter.log(format!("  not usable: {reason}"));
                        attempts.push(format!("{candidate}: probe failed, {reason}"));
                        continue;
                    }
                };
                reporter.log(format!("  found {version}"));

                let provisioned =
                    environment::provision(candidate.invocation(), env_dir, reporter, cancel).await;
                match provisioned {
                    Ok(env) => {
                        log::info!("Using interpreter {} ({})", candidate, version);
                        return Ok((candidate, env));
                    }
                    Err(e @ Error::EnvironmentCreationFailed { .. }) => {
                        reporter.log(format!("  {e}"));
                        attempts.push(format!("{candidate}: {e}"));
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        for line in remediation() {
            reporter.log(line);
        }
        Err(Error::InterpreterNotFound { attempts })
    }
}

/// Advice logged when no interpreter works.
pub fn remediation() -> Vec<String> {
    let mut lines = vec![
        "No usable Python interpreter was found.".to_string(),
        "Install Python 3.10, 3.11 or 3.12 with the venv module available:".to_string(),
    ];
    if cfg!(windows) {
        lines.push(
            "  • Download from https://www.python.org/downloads/ and tick \"Add python.exe to PATH\""
                .into(),
        );
        lines.push("  • Or run: winget install Python.Python.3.12".into());
    } else if cfg!(target_os = "macos") {
        lines.push("  • Run: brew install python@3.12".into());
        lines.push("  • Or download from https://www.python.org/downloads/".into());
    } else {
        lines.push("  • Debian/Ubuntu: sudo apt install python3 python3-venv".into());
        lines.push("  • Fedora: sudo dnf install python3".into());
    }
    lines.push(
        "Or name an interpreter explicitly with --python <path> (or PYONEDIR_PYTHON).".into(),
    );
    lines
}
