//! pyonedir - builds standalone one-directory bundles from Python projects.
//!
//! This binary resolves a project directory or zip archive, builds it with
//! PyInstaller inside a fresh virtual environment, and writes the bundle and
//! its zip next to the source.

use std::process;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Run CLI and get exit code
    let exit_code = match pyonedir::cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            if let Some(hint) = e.hint() {
                eprintln!("{}", hint);
            }
            1
        }
    };

    process::exit(exit_code);
}
