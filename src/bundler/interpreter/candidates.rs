//! Interpreter candidate sources.
//!
//! Each [`CandidateSource`] knows how to list the interpreters it can see.
//! Sources are only consulted when every earlier candidate has failed, so a
//! host with a working `python3` on `PATH` never pays for the slower ones.

use super::launcher::{PY_LAUNCHER, parse_listing};
use crate::bundler::{
    process::Invocation,
    settings::{PROBE_TIMEOUT, SUPPORTED_MINORS},
};
use regex::Regex;
use std::{
    fmt,
    path::{Path, PathBuf},
    process::Stdio,
    sync::LazyLock,
};

/// Where a candidate came from, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CandidateSource {
    /// Named by the user.
    Explicit,
    /// The process running this build, when it is itself a Python interpreter.
    CurrentProcess,
    /// Reported by, or invoked through, the `py` launcher.
    Launcher,
    /// Found on `PATH`.
    SearchPath,
    /// A conventional installation directory.
    KnownLocation,
}

impl CandidateSource {
    /// Default discovery order.
    pub const ALL: [CandidateSource; 5] = [
        Self::Explicit,
        Self::CurrentProcess,
        Self::Launcher,
        Self::SearchPath,
        Self::KnownLocation,
    ];
}

impl fmt::Display for CandidateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Explicit => "user supplied",
            Self::CurrentProcess => "current process",
            Self::Launcher => "py launcher",
            Self::SearchPath => "PATH",
            Self::KnownLocation => "install location",
        };
        f.write_str(name)
    }
}

/// A potential Python runtime, not yet probed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterCandidate {
    invocation: Invocation,
    source: CandidateSource,
}

impl InterpreterCandidate {
    pub fn new(invocation: Invocation, source: CandidateSource) -> Self {
        Self { invocation, source }
    }

    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    pub fn source(&self) -> CandidateSource {
        self.source
    }
}

impl fmt::Display for InterpreterCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.invocation, self.source)
    }
}

/// Lists the candidates `source` can see on this host.
pub async fn discover(source: CandidateSource, explicit: &[PathBuf]) -> Vec<InterpreterCandidate> {
    let invocations = match source {
        CandidateSource::Explicit => explicit.iter().cloned().map(Invocation::new).collect(),
        CandidateSource::CurrentProcess => current_process(),
        CandidateSource::Launcher => launcher().await,
        CandidateSource::SearchPath => search_path(),
        CandidateSource::KnownLocation => known_locations(),
    };

    log::debug!("{} candidate(s) from {}", invocations.len(), source);
    invocations
        .into_iter()
        .map(|invocation| InterpreterCandidate::new(invocation, source))
        .collect()
}

static PYTHON_BINARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^python(\d+(\.\d+)?)?$").expect("python binary regex is valid")
});

/// Whether `path` names a real interpreter binary rather than, say, a
/// frozen application that happens to embed Python.
pub fn is_python_binary(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|stem| PYTHON_BINARY.is_match(stem))
}

fn current_process() -> Vec<Invocation> {
    match std::env::current_exe() {
        Ok(exe) if is_python_binary(&exe) => vec![Invocation::new(exe)],
        _ => Vec::new(),
    }
}

async fn launcher() -> Vec<Invocation> {
    if !cfg!(windows) {
        return Vec::new();
    }
    let Some(py) = PY_LAUNCHER.as_ref() else {
        return Vec::new();
    };

    let mut found = Vec::new();

    let listing = tokio::process::Command::new(py)
        .arg("--list-paths")
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output();
    match tokio::time::timeout(PROBE_TIMEOUT, listing).await {
        Ok(Ok(output)) if output.status.success() => {
            let text = String::from_utf8_lossy(&output.stdout);
            found.extend(
                parse_listing(&text)
                    .into_iter()
                    .filter(|entry| entry.is_supported())
                    .map(|entry| Invocation::new(entry.path)),
            );
        }
        Ok(Ok(output)) => log::debug!("py --list-paths exited with {:?}", output.status.code()),
        Ok(Err(e)) => log::debug!("py --list-paths failed: {}", e),
        Err(_) => log::debug!("py --list-paths timed out"),
    }

    for minor in SUPPORTED_MINORS.rev() {
        found.push(Invocation::with_prefix(py, [format!("-3.{minor}")]));
    }
    found
}

/// Executable names to look up on `PATH`, version-qualified first.
pub fn search_names() -> Vec<String> {
    let mut names: Vec<String> = SUPPORTED_MINORS
        .rev()
        .map(|minor| format!("python3.{minor}"))
        .collect();
    names.push("python3".to_string());
    names.push("python".to_string());
    names
}

fn search_path() -> Vec<Invocation> {
    search_names()
        .iter()
        .filter_map(|name| which::which(name).ok())
        .map(Invocation::new)
        .collect()
}

fn known_locations() -> Vec<Invocation> {
    known_location_paths()
        .into_iter()
        .filter(|path| path.is_file())
        .map(Invocation::new)
        .collect()
}

#[cfg(windows)]
fn known_location_paths() -> Vec<PathBuf> {
    let mut roots = Vec::new();
    if let Some(local) = dirs::data_local_dir() {
        roots.push(local.join("Programs").join("Python"));
    }
    roots.push(PathBuf::from("C:\\"));
    roots.push(PathBuf::from("C:\\Program Files"));

    let mut paths = Vec::new();
    for root in &roots {
        for minor in SUPPORTED_MINORS.rev() {
            paths.push(root.join(format!("Python3{minor}")).join("python.exe"));
        }
    }
    paths
}

#[cfg(not(windows))]
fn known_location_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for dir in ["/usr/local/bin", "/usr/bin", "/opt/homebrew/bin"] {
        for minor in SUPPORTED_MINORS.rev() {
            paths.push(Path::new(dir).join(format!("python3.{minor}")));
        }
        paths.push(Path::new(dir).join("python3"));
    }
    for minor in SUPPORTED_MINORS.rev() {
        paths.push(PathBuf::from(format!(
            "/Library/Frameworks/Python.framework/Versions/3.{minor}/bin/python3"
        )));
    }
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".pyenv").join("shims").join("python3"));
        paths.push(home.join(".local").join("bin").join("python3"));
    }
    paths
}
