//! Locating the bundler's one-directory output.

use crate::bundler::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Finds the bundle directory inside `dist_dir`.
///
/// `dist_dir/<expected>` wins. A spec file may name the bundle differently,
/// so a lone directory in `dist_dir` is accepted as well. Anything else is
/// [`Error::ArtifactNotFound`] with a listing of what was there.
pub async fn locate_bundle(dist_dir: &Path, expected: &str) -> Result<PathBuf> {
    let preferred = dist_dir.join(expected);
    if tokio::fs::metadata(&preferred)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
    {
        return Ok(preferred);
    }

    let dist_dir_owned = dist_dir.to_path_buf();
    let scan = tokio::task::spawn_blocking(move || scan_dist(&dist_dir_owned))
        .await
        .map_err(|e| Error::GenericError(format!("Output scan task panicked: {}", e)))?;

    match scan {
        Ok(DistScan { dirs, listing }) => {
            if let [only] = dirs.as_slice() {
                log::info!(
                    "Expected {} not found; using {}",
                    preferred.display(),
                    only.display()
                );
                return Ok(only.clone());
            }

            let reason = if listing.is_empty() {
                "the output directory is empty".to_string()
            } else {
                format!(
                    "expected `{}`; directory contents:\n{}",
                    expected,
                    listing.join("\n")
                )
            };
            Err(Error::ArtifactNotFound {
                dist_dir: dist_dir.to_path_buf(),
                reason,
            })
        }
        Err(e) => Err(Error::ArtifactNotFound {
            dist_dir: dist_dir.to_path_buf(),
            reason: format!("cannot read directory: {}", e),
        }),
    }
}

struct DistScan {
    dirs: Vec<PathBuf>,
    listing: Vec<String>,
}

fn scan_dist(dist_dir: &Path) -> std::io::Result<DistScan> {
    let mut entries: Vec<_> = std::fs::read_dir(dist_dir)?.flatten().collect();
    entries.sort_by_key(|e| e.file_name());

    let mut dirs = Vec::new();
    let mut listing = Vec::new();
    for entry in entries {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if path.is_dir() {
            listing.push(format!("  [DIR]  {}", name));
            dirs.push(path);
        } else {
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            listing.push(format!("  [FILE] {} ({} bytes)", name, size));
        }
    }

    Ok(DistScan { dirs, listing })
}
