//! Styled terminal output for the command-line front-end.

use console::{Style, Term};
use std::io;

/// Writes user-facing messages.
///
/// In JSON mode every human-readable line goes to stderr so stdout carries
/// only the JSON document. Errors always go to stderr.
#[derive(Debug, Clone)]
pub struct OutputManager {
    term: Term,
    errors: Term,
    quiet: bool,
    on_stderr: bool,
}

impl OutputManager {
    /// Creates an output manager.
    ///
    /// `quiet` suppresses streamed build log lines; `json` moves all human
    /// output to stderr.
    pub fn new(quiet: bool, json: bool) -> Self {
        let term = if json { Term::stderr() } else { Term::stdout() };
        Self {
            term,
            errors: Term::stderr(),
            quiet,
            on_stderr: json,
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    fn style(&self) -> Style {
        let style = Style::new();
        if self.on_stderr { style.for_stderr() } else { style }
    }

    /// One line of streamed build output.
    pub fn build_line(&self, line: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.term
            .write_line(&format!("  {}", self.style().dim().apply_to(line)))
    }

    /// Progress message.
    pub fn progress(&self, message: &str) -> io::Result<()> {
        self.term
            .write_line(&format!("{}", self.style().cyan().bold().apply_to(message)))
    }

    /// Section header.
    pub fn section(&self, title: &str) -> io::Result<()> {
        self.term.write_line(&format!("{}", self.style().bold().apply_to(title)))
    }

    /// Indented detail line.
    pub fn indent(&self, message: &str) -> io::Result<()> {
        self.term.write_line(&format!("  {message}"))
    }

    pub fn success(&self, message: &str) -> io::Result<()> {
        self.term
            .write_line(&format!("{} {}", self.style().green().bold().apply_to("✓"), message))
    }

    pub fn warn(&self, message: &str) -> io::Result<()> {
        let style = Style::new().for_stderr().yellow().bold();
        self.errors
            .write_line(&format!("{} {}", style.apply_to("warning:"), message))
    }

    pub fn error(&self, message: &str) -> io::Result<()> {
        let style = Style::new().for_stderr().red().bold();
        self.errors
            .write_line(&format!("{} {}", style.apply_to("error:"), message))
    }
}
