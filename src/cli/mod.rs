//! Command line interface for pyonedir.
//!
//! This module parses arguments, runs one build on a worker thread, renders
//! its events as they arrive, and maps the outcome to an exit code.

mod args;
mod output;

pub use args::{Args, RuntimeConfig};
pub use output::OutputManager;

use crate::{
    bundler::{BuildEvent, BuildOutcome, BuildPhase, BuildRequest, BuildWorker, Builder, ErrorKind},
    error::{CliError, Result},
};

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    args.validate()
        .map_err(|reason| CliError::InvalidArguments { reason })?;

    let config = RuntimeConfig::from(&args);
    let request = args.to_request()?;
    execute(request, &config).await
}

/// Runs one build and reports it; returns the process exit code.
///
/// Ctrl-C cancels the build. The build still cleans up and finishes, and
/// the exit code is then 130.
pub async fn execute(request: BuildRequest, config: &RuntimeConfig) -> Result<i32> {
    let output = config.output();
    output.section(&format!("Building {}", request.source().path().display()))?;

    let handle = BuildWorker::spawn(Builder::new(request))?;
    log::debug!("Build {} spawned", handle.id());

    let cancel = handle.cancellation_token();
    let interrupt_output = output.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = interrupt_output.warn("Interrupted; cancelling build...");
            cancel.cancel();
        }
    });

    let mut render_failed = false;
    let outcome = handle
        .wait_with(|event| {
            if render_failed {
                return;
            }
            if let Err(e) = render_event(output, event) {
                log::warn!("Failed to write build output: {}", e);
                render_failed = true;
            }
        })
        .await;
    interrupt.abort();

    report_outcome(&outcome, config)?;
    Ok(outcome.exit_code())
}

fn render_event(output: &OutputManager, event: &BuildEvent) -> std::io::Result<()> {
    match event {
        BuildEvent::Log(line) => output.build_line(line),
        BuildEvent::Progress(percent) => {
            let label = BuildPhase::from_percent(*percent)
                .map(BuildPhase::label)
                .unwrap_or("Working");
            output.progress(&format!("[{percent:>3}%] {label}"))
        }
        BuildEvent::Warning(message) => output.warn(message),
        BuildEvent::Finished(_) => Ok(()),
    }
}

fn report_outcome(outcome: &BuildOutcome, config: &RuntimeConfig) -> Result<()> {
    let output = config.output();

    match outcome {
        BuildOutcome::Success(artifact) => {
            output.success("Build complete")?;
            output.indent(&format!("Folder:  {}", artifact.output_dir.display()))?;
            output.indent(&format!(
                "Archive: {} ({} bytes)",
                artifact.archive.display(),
                artifact.archive_size
            ))?;
            output.indent(&format!("SHA256:  {}", artifact.archive_sha256))?;
        }
        BuildOutcome::Failed(failure) if failure.kind == ErrorKind::Cancelled => {
            output.warn("Build cancelled")?;
        }
        BuildOutcome::Failed(failure) => {
            output.error(&format!("{} ({})", failure.message, failure.kind))?;
            if output.is_quiet() {
                // The log was not streamed; show its tail for context.
                let start = failure.log.len().saturating_sub(FAILURE_LOG_TAIL);
                for line in &failure.log[start..] {
                    output.indent(line)?;
                }
            }
        }
    }

    if config.json() {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    }

    Ok(())
}

/// Log lines shown with a failure when the log was not streamed.
const FAILURE_LOG_TAIL: usize = 20;
