//! Windows `py` launcher detection and listing parser.

use crate::bundler::settings::SUPPORTED_MINORS;
use regex::Regex;
use std::{path::PathBuf, sync::LazyLock};

/// Location of the `py` launcher, if one is on `PATH`.
///
/// Cached to avoid repeated lookups across candidate generation.
pub static PY_LAUNCHER: LazyLock<Option<PathBuf>> = LazyLock::new(|| match which::which("py") {
    Ok(path) => {
        log::debug!("Found py launcher at: {}", path.display());
        Some(path)
    }
    Err(e) => {
        log::debug!("py launcher not found in PATH: {}", e);
        None
    }
});

/// Matches `py --list-paths` rows in both launcher formats:
///
/// ```text
///  -V:3.12 *        C:\Python312\python.exe
///  -3.11-64         C:\Python311\python.exe
///  -3.10-32 *       C:\Python310-32\python.exe
/// ```
static LISTING_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*-(?:V:)?(\d+)\.(\d+)\S*\s+(?:\*\s+)?(\S.*?)(?:\s+\*)?\s*$")
        .expect("launcher listing regex is valid")
});

/// An interpreter reported by the launcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherEntry {
    pub major: u32,
    pub minor: u32,
    pub path: PathBuf,
}

impl LauncherEntry {
    pub fn is_supported(&self) -> bool {
        self.major == 3 && SUPPORTED_MINORS.contains(&self.minor)
    }
}

/// Parses `py --list-paths` output, in listing order.
///
/// Rows for non-CPython distributions (`-V:Company/Tag`) are skipped.
pub fn parse_listing(output: &str) -> Vec<LauncherEntry> {
    output
        .lines()
        .filter_map(|line| {
            let caps = LISTING_ROW.captures(line)?;
            Some(LauncherEntry {
                major: caps[1].parse().ok()?,
                minor: caps[2].parse().ok()?,
                path: PathBuf::from(caps[3].trim()),
            })
        })
        .collect()
}
