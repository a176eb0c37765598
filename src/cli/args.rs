//! Command line argument parsing and validation.
//!
//! This module provides CLI argument parsing using clap, validation that
//! runs before a build starts, and conversion into a [`BuildRequest`].

use crate::bundler::{BuildRequest, BuildRequestBuilder, Result};
use clap::Parser;
use std::path::PathBuf;

/// Separator for several interpreters in `PYONEDIR_PYTHON`.
const PATH_LIST_SEPARATOR: char = if cfg!(windows) { ';' } else { ':' };

/// One-directory bundle builder for Python projects
#[derive(Parser, Debug)]
#[command(
    name = "pyonedir",
    version,
    about = "Builds a standalone one-directory bundle from a Python project",
    long_about = "Builds a standalone one-directory executable bundle from a Python project with PyInstaller.

The project is a directory or .zip archive containing app.py (at the top level or one folder down).
A fresh virtual environment is created for every build; requirements.txt, pyinstaller.spec,
icon.ico and build_add_data.txt are honoured when present.

Usage:
  pyonedir ./hello
  pyonedir hello.zip --noconsole --icon brand.ico
  pyonedir ./hello --python /opt/python3.12/bin/python3 --json

Writes <name>_onedir/ and <name>_onedir.zip next to the source.
Exit code 0 = both outputs guaranteed to exist; 130 = cancelled."
)]
pub struct Args {
    /// Project directory or .zip archive
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Build a windowed executable without a console
    #[arg(long)]
    pub noconsole: bool,

    /// Icon file for the executable (defaults to icon.ico in the project)
    #[arg(long, value_name = "PATH")]
    pub icon: Option<PathBuf>,

    /// Interpreter to try before any discovered one (repeatable)
    #[arg(
        long = "python",
        value_name = "PATH",
        env = "PYONEDIR_PYTHON",
        value_delimiter = PATH_LIST_SEPARATOR
    )]
    pub python: Vec<PathBuf>,

    /// Print the build outcome as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Do not stream build output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.source.as_os_str().is_empty() {
            return Err("Source cannot be empty".to_string());
        }

        if let Some(icon) = &self.icon {
            if !icon.is_file() {
                return Err(format!("Icon file not found: {}", icon.display()));
            }
        }

        Ok(())
    }

    /// Builds the request these arguments describe.
    pub fn to_request(&self) -> Result<BuildRequest> {
        let mut builder = BuildRequestBuilder::new()
            .source(&self.source)
            .hide_console(self.noconsole);
        if let Some(icon) = &self.icon {
            builder = builder.icon(icon);
        }
        for python in self.python.iter().filter(|p| !p.as_os_str().is_empty()) {
            builder = builder.interpreter(python);
        }
        builder.build()
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for styled terminal output
    output: super::OutputManager,
    json: bool,
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self {
            output: super::OutputManager::new(args.quiet, args.json),
            json: args.json,
        }
    }
}

impl RuntimeConfig {
    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    /// Whether the outcome is printed as JSON
    pub fn json(&self) -> bool {
        self.json
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags_and_repeated_interpreters() {
        let args = Args::try_parse_from([
            "pyonedir",
            "hello.zip",
            "--noconsole",
            "--python",
            "/a/python3",
            "--python",
            "/b/python3",
            "--json",
        ])
        .unwrap();

        assert_eq!(args.source, PathBuf::from("hello.zip"));
        assert!(args.noconsole);
        assert!(args.json);
        assert!(!args.quiet);
        assert_eq!(
            args.python,
            vec![PathBuf::from("/a/python3"), PathBuf::from("/b/python3")]
        );
    }

    #[test]
    fn source_is_required() {
        assert!(Args::try_parse_from(["pyonedir"]).is_err());
    }

    #[test]
    fn missing_icon_fails_validation() {
        let args = Args::try_parse_from(["pyonedir", ".", "--icon", "/no/such/icon.ico"]).unwrap();
        assert!(args.validate().unwrap_err().contains("Icon file not found"));
    }

    #[test]
    fn request_carries_options() {
        let project = tempfile::tempdir().unwrap();
        let source = project.path().to_string_lossy().into_owned();
        let args =
            Args::try_parse_from([
                "pyonedir",
                source.as_str(),
                "--noconsole",
                "--python",
                "/x/python",
            ])
                .unwrap();

        let request = args.to_request().unwrap();
        assert!(request.options().hide_console);
        assert_eq!(request.interpreters(), [PathBuf::from("/x/python")]);
    }
}
