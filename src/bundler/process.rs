//! Subprocess invocation and live output streaming.

use super::{
    error::{Error, Result},
    events::Reporter,
};
use std::{
    ffi::{OsStr, OsString},
    fmt,
    io::{self, BufRead},
    path::{Path, PathBuf},
    process::{ExitStatus, Stdio},
    time::Duration,
};
use tokio::{
    process::{Child, Command},
    sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel},
};
use tokio_util::sync::CancellationToken;

/// A program plus the leading arguments every call to it starts with.
///
/// `py -3.11` is program `py` with prefix `-3.11`; an environment's package
/// installer is its interpreter with prefix `-m pip`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Invocation {
    program: PathBuf,
    prefix: Vec<OsString>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            prefix: Vec::new(),
        }
    }

    pub fn with_prefix<I, S>(program: impl Into<PathBuf>, prefix: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        Self {
            program: program.into(),
            prefix: prefix.into_iter().map(|a| a.as_ref().to_os_string()).collect(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn prefix(&self) -> &[OsString] {
        &self.prefix
    }

    /// Builds a command running this invocation followed by `args`.
    pub fn command<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(&self.program);
        command.args(&self.prefix).args(args);
        command
    }

    /// Renders this invocation followed by `args` as a shell-like line.
    pub fn display_with<I, S>(&self, args: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut line = self.to_string();
        for arg in args {
            line.push(' ');
            line.push_str(&arg.as_ref().to_string_lossy());
        }
        line
    }

    /// Identity used to drop duplicate candidates.
    ///
    /// Paths that exist are canonicalised, so a symlink and its target
    /// collapse into one entry.
    pub fn signature(&self) -> String {
        let program = std::fs::canonicalize(&self.program).unwrap_or_else(|_| self.program.clone());
        self.display_for(&program)
    }

    fn display_for(&self, program: &Path) -> String {
        let mut line = program.to_string_lossy().into_owned();
        for arg in &self.prefix {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_for(&self.program))
    }
}

/// Describes an exit status for messages ("exited with code 2").
pub fn describe_status(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exited with code {code}"),
        None => "was terminated by a signal".to_string(),
    }
}

/// Runs `invocation args...` and streams its merged stdout/stderr to `reporter`.
///
/// Both streams share one pipe, so lines arrive in the order the child wrote
/// them. Cancelling `cancel` kills the child's whole process tree and returns
/// [`Error::Cancelled`].
pub async fn run_streaming<I, S>(
    invocation: &Invocation,
    args: I,
    cwd: Option<&Path>,
    reporter: &Reporter,
    cancel: &CancellationToken,
) -> Result<ExitStatus>
where
    I: IntoIterator<Item = S> + Clone,
    S: AsRef<OsStr>,
{
    let display = invocation.display_with(args.clone());

    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    reporter.log(format!("$ {display}"));
    log::debug!("Spawning: {}", display);

    let spawned = spawn_merged(invocation.command(args), cwd);
    let (mut child, lines) = spawned.map_err(|error| Error::CommandFailed {
        command: display.clone(),
        error,
    })?;

    let finished = tokio::select! {
        _ = cancel.cancelled() => None,
        status = stream_until_exit(&mut child, lines, reporter) => Some(status),
    };

    match finished {
        Some(status) => status.map_err(|error| Error::CommandFailed {
            command: display,
            error,
        }),
        None => {
            log::warn!("Cancelling: {}", display);
            if let Err(e) = kill_tree(&mut child).await {
                log::warn!("Failed to kill {}: {}", display, e);
            }
            let _ = child.wait().await;
            reporter.log("Build cancelled; subprocess terminated.");
            Err(Error::Cancelled)
        }
    }
}

/// Spawns `command` with stdout and stderr on a single pipe and starts a
/// reader thread that forwards each line of it.
///
/// The command is consumed so its copies of the write end close right after
/// the spawn; the line channel then ends once every process holding the pipe
/// has exited.
fn spawn_merged(
    mut command: Command,
    cwd: Option<&Path>,
) -> io::Result<(Child, UnboundedReceiver<String>)> {
    let (reader, writer) = io::pipe()?;
    command
        .stdin(Stdio::null())
        .stdout(Stdio::from(writer.try_clone()?))
        .stderr(Stdio::from(writer))
        .env("PYTHONUNBUFFERED", "1")
        .env("PIP_DISABLE_PIP_VERSION_CHECK", "1")
        .kill_on_drop(true);
    #[cfg(unix)]
    command.process_group(0);
    if let Some(cwd) = cwd {
        command.current_dir(cwd);
    }

    let child = command.spawn()?;
    drop(command);

    let (tx, rx) = unbounded_channel();
    std::thread::Builder::new()
        .name("pyonedir-output".into())
        .spawn(move || forward_lines(reader, tx))?;
    Ok((child, rx))
}

/// Reads lines until end of file, decoding lossily so non-UTF-8 tool output
/// still streams.
fn forward_lines(reader: io::PipeReader, tx: UnboundedSender<String>) {
    let mut reader = io::BufReader::new(reader);
    let mut segment = Vec::new();
    loop {
        segment.clear();
        match reader.read_until(b'\n', &mut segment) {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&segment);
                let line = line.trim_end_matches('\n').trim_end_matches('\r');
                if tx.send(line.to_string()).is_err() {
                    break;
                }
            }
            Err(e) => {
                log::debug!("Output pipe read failed: {}", e);
                break;
            }
        }
    }
}

/// Forwards output lines until the pipe closes, then waits for the exit status.
async fn stream_until_exit(
    child: &mut Child,
    mut lines: UnboundedReceiver<String>,
    reporter: &Reporter,
) -> io::Result<ExitStatus> {
    while let Some(line) = lines.recv().await {
        reporter.log(line);
    }
    child.wait().await
}

/// Kills the child and everything it started.
#[cfg(unix)]
async fn kill_tree(child: &mut Child) -> io::Result<()> {
    use nix::{
        errno::Errno,
        sys::signal::{Signal, killpg},
        unistd::Pid,
    };

    if let Some(pid) = child.id() {
        // The child leads its own process group.
        match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(e) => log::warn!("Failed to signal process group {}: {}", pid, e),
        }
    }
    child.start_kill()
}

/// Kills the child and everything it started.
#[cfg(windows)]
async fn kill_tree(child: &mut Child) -> io::Result<()> {
    if let Some(pid) = child.id() {
        let status = Command::new("taskkill")
            .args(["/T", "/F", "/PID", &pid.to_string()])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        match status {
            Ok(status) if status.success() => return Ok(()),
            Ok(status) => log::warn!("taskkill {}", describe_status(status)),
            Err(e) => log::warn!("Failed to run taskkill: {}", e),
        }
    }
    child.start_kill()
}

/// Runs `invocation --version` and returns the reported version text.
///
/// Only a zero exit status within `timeout` counts as success; the error
/// string explains what went wrong otherwise.
pub async fn probe_version(
    invocation: &Invocation,
    timeout: Duration,
) -> std::result::Result<String, String> {
    let mut command = invocation.command(["--version"]);
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = match tokio::time::timeout(timeout, command.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return Err(format!("could not start: {e}")),
        Err(_) => return Err(format!("no answer within {}s", timeout.as_secs())),
    };

    if !output.status.success() {
        return Err(describe_status(output.status));
    }

    // Older interpreters print the version on stderr.
    let mut version = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if version.is_empty() {
        version = String::from_utf8_lossy(&output.stderr).trim().to_string();
    }
    Ok(version)
}
