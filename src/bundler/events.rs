//! Build events delivered from the worker to a front-end.
//!
//! The worker never touches caller state directly. It pushes [`BuildEvent`]s
//! into a channel and the front-end drains them at its own pace.

use super::builder::BuildOutcome;
use std::sync::{
    Mutex,
    atomic::{AtomicU8, Ordering},
};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

/// Log target used to mirror build output into the diagnostic log.
const BUILD_LOG_TARGET: &str = "pyonedir::build";

/// Pipeline phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BuildPhase {
    Validate,
    ProvisionEnv,
    InstallDeps,
    RunCompiler,
    Package,
    Done,
}

impl BuildPhase {
    pub const ALL: [Self; 6] = [
        Self::Validate,
        Self::ProvisionEnv,
        Self::InstallDeps,
        Self::RunCompiler,
        Self::Package,
        Self::Done,
    ];

    /// The phase that reports `percent`, if any.
    pub fn from_percent(percent: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|phase| phase.percent() == percent)
    }

    /// Progress percentage reported when the phase starts.
    pub fn percent(self) -> u8 {
        match self {
            Self::Validate => 5,
            Self::ProvisionEnv => 20,
            Self::InstallDeps => 40,
            Self::RunCompiler => 70,
            Self::Package => 90,
            Self::Done => 100,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Validate => "Resolving project",
            Self::ProvisionEnv => "Provisioning environment",
            Self::InstallDeps => "Installing dependencies",
            Self::RunCompiler => "Running bundler",
            Self::Package => "Packaging output",
            Self::Done => "Done",
        }
    }
}

/// A single notification from a running build.
#[derive(Debug, Clone)]
pub enum BuildEvent {
    /// One line of build output.
    Log(String),
    /// Progress percentage; never decreases within a build.
    Progress(u8),
    /// A notice for the user that should not be buried in the log.
    Warning(String),
    /// Terminal result. Always the last event of a build.
    Finished(BuildOutcome),
}

/// Sending half of the event channel, plus the captured transcript.
///
/// Everything logged through a reporter is kept so a failed build can hand
/// the whole log back with its error.
#[derive(Debug)]
pub struct Reporter {
    tx: UnboundedSender<BuildEvent>,
    transcript: Mutex<Vec<String>>,
    progress: AtomicU8,
}

impl Reporter {
    /// Creates a reporter and the receiver its events arrive on.
    pub fn channel() -> (Self, UnboundedReceiver<BuildEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn new(tx: UnboundedSender<BuildEvent>) -> Self {
        Self {
            tx,
            transcript: Mutex::new(Vec::new()),
            progress: AtomicU8::new(0),
        }
    }

    /// Emits one log line.
    pub fn log(&self, line: impl Into<String>) {
        let line = line.into();
        log::debug!(target: BUILD_LOG_TARGET, "{}", line);
        if let Ok(mut transcript) = self.transcript.lock() {
            transcript.push(line.clone());
        }
        // Receiver gone means nobody is watching; the build carries on.
        let _ = self.tx.send(BuildEvent::Log(line));
    }

    /// Emits a warning. The transcript keeps it as a `Warning:` line.
    pub fn warn(&self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{}", message);
        if let Ok(mut transcript) = self.transcript.lock() {
            transcript.push(format!("Warning: {message}"));
        }
        let _ = self.tx.send(BuildEvent::Warning(message));
    }

    /// Emits the start of `phase`.
    pub fn phase(&self, phase: BuildPhase) {
        log::info!("{} ({}%)", phase.label(), phase.percent());
        self.progress(phase.percent());
    }

    /// Emits a progress value, ignoring anything below what was already sent.
    pub fn progress(&self, percent: u8) {
        let percent = percent.min(100);
        let previous = self.progress.fetch_max(percent, Ordering::SeqCst);
        if percent > previous {
            let _ = self.tx.send(BuildEvent::Progress(percent));
        }
    }

    /// Returns the last progress value sent.
    pub fn current_progress(&self) -> u8 {
        self.progress.load(Ordering::SeqCst)
    }

    /// Returns a copy of every line logged so far.
    pub fn transcript(&self) -> Vec<String> {
        self.transcript
            .lock()
            .map(|t| t.clone())
            .unwrap_or_default()
    }

    /// Sends the terminal event.
    pub fn finish(&self, outcome: BuildOutcome) {
        let _ = self.tx.send(BuildEvent::Finished(outcome));
    }
}
