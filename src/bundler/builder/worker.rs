//! Running builds off the caller's thread.
//!
//! Each build gets its own OS thread with a current-thread tokio runtime, so
//! a front-end's event loop never blocks on a build and builds never share
//! runtime state.

use super::{
    orchestrator::Builder,
    outcome::{BuildFailure, BuildOutcome},
};
use crate::bundler::{
    Error, Result,
    events::{BuildEvent, Reporter},
};
use std::thread::JoinHandle;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Starts builds on dedicated worker threads.
pub struct BuildWorker;

impl BuildWorker {
    /// Spawns `builder` on a new thread and returns a handle to its events.
    ///
    /// The last event of every build is [`BuildEvent::Finished`].
    pub fn spawn(builder: Builder) -> Result<BuildHandle> {
        let (reporter, events) = Reporter::channel();
        let cancel = builder.cancellation_token();
        let id = Uuid::new_v4();

        let thread = std::thread::Builder::new()
            .name(format!("pyonedir-build-{}", id.simple()))
            .spawn(move || {
                log::debug!("Build {} started", id);
                let outcome = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime.block_on(builder.run(&reporter)),
                    Err(e) => {
                        let error =
                            Error::GenericError(format!("failed to start build runtime: {e}"));
                        BuildOutcome::Failed(BuildFailure::new(&error, reporter.transcript()))
                    }
                };
                reporter.finish(outcome.clone());
                log::debug!("Build {} finished", id);
                outcome
            })?;

        Ok(BuildHandle {
            id,
            events,
            cancel,
            thread: Some(thread),
        })
    }
}

/// A running build.
#[derive(Debug)]
pub struct BuildHandle {
    id: Uuid,
    events: UnboundedReceiver<BuildEvent>,
    cancel: CancellationToken,
    thread: Option<JoinHandle<BuildOutcome>>,
}

impl BuildHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Requests cancellation. The build still finishes with a
    /// [`BuildEvent::Finished`] event.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Receives the next event, or `None` once the build is over.
    pub async fn next_event(&mut self) -> Option<BuildEvent> {
        self.events.recv().await
    }

    /// Waits for the build to finish, discarding intermediate events.
    pub async fn wait(self) -> BuildOutcome {
        self.wait_with(|_| {}).await
    }

    /// Waits for the build to finish, passing every event to `on_event`.
    pub async fn wait_with<F>(mut self, mut on_event: F) -> BuildOutcome
    where
        F: FnMut(&BuildEvent),
    {
        while let Some(event) = self.events.recv().await {
            on_event(&event);
            if let BuildEvent::Finished(outcome) = event {
                self.join().await;
                return outcome;
            }
        }
        self.join().await.unwrap_or_else(worker_lost)
    }

    /// Blocking variant of [`wait_with`](Self::wait_with) for callers outside
    /// any async runtime.
    pub fn blocking_wait<F>(mut self, mut on_event: F) -> BuildOutcome
    where
        F: FnMut(&BuildEvent),
    {
        while let Some(event) = self.events.blocking_recv() {
            on_event(&event);
            if let BuildEvent::Finished(outcome) = event {
                if let Some(thread) = self.thread.take() {
                    let _ = thread.join();
                }
                return outcome;
            }
        }
        self.thread
            .take()
            .and_then(|thread| thread.join().ok())
            .unwrap_or_else(worker_lost)
    }

    async fn join(&mut self) -> Option<BuildOutcome> {
        let thread = self.thread.take()?;
        match tokio::task::spawn_blocking(move || thread.join()).await {
            Ok(Ok(outcome)) => Some(outcome),
            Ok(Err(_)) => {
                log::error!("Build {} worker panicked", self.id);
                None
            }
            Err(e) => {
                log::error!("Failed to join build {}: {}", self.id, e);
                None
            }
        }
    }
}

fn worker_lost() -> BuildOutcome {
    let error = Error::GenericError("build worker stopped without a result".to_string());
    BuildOutcome::Failed(BuildFailure::new(&error, Vec::new()))
}
