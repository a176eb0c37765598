//! One-directory bundle builder for Python application projects.
//!
//! This library turns a Python project (a directory or a zip archive with an
//! `app.py` entry point) into:
//! - a standalone one-directory executable bundle produced by PyInstaller
//! - a zip of that bundle, placed next to the source
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod bundler;
pub mod cli;
pub mod error;
pub mod source;

// Re-export commonly used types
pub use error::{BundlerError, CliError, Result};
