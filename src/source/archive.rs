//! Zip extraction with entry path validation.

use crate::bundler::error::{Error, ErrorExt, Result};
use std::{
    fs::File,
    io,
    path::{Path, PathBuf},
};

/// Rejects entry names that are absolute or climb out with `..`.
///
/// Both `/` and `\` count as separators so archives written on Windows are
/// held to the same rule.
pub fn validate_entry_name(name: &str) -> Result<()> {
    let bytes = name.as_bytes();
    let absolute = name.starts_with('/')
        || name.starts_with('\\')
        || (bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':');
    let climbs = name.split(['/', '\\']).any(|component| component == "..");

    if absolute || climbs || Path::new(name).is_absolute() {
        return Err(Error::PathTraversal {
            entry: name.to_string(),
        });
    }
    Ok(())
}

/// Extracts `archive` into `dest`, returning the number of entries written.
///
/// Every entry name is validated before anything is written, so a single bad
/// entry leaves `dest` untouched.
pub async fn extract_zip(archive: &Path, dest: &Path) -> Result<usize> {
    let archive = archive.to_path_buf();
    let dest = dest.to_path_buf();

    tokio::task::spawn_blocking(move || extract_zip_blocking(&archive, &dest))
        .await
        .map_err(|e| Error::GenericError(format!("archive extraction task panicked: {e}")))?
}

fn extract_zip_blocking(archive: &Path, dest: &Path) -> Result<usize> {
    let file = File::open(archive).fs_context("opening archive", archive)?;
    let mut zip = zip::ZipArchive::new(file)?;

    for name in zip.file_names() {
        validate_entry_name(name)?;
    }

    std::fs::create_dir_all(dest).fs_context("creating extraction directory", dest)?;

    for index in 0..zip.len() {
        let mut entry = zip.by_index(index)?;
        let relative = relative_entry_path(entry.name());
        if relative.as_os_str().is_empty() {
            continue;
        }
        let out_path = dest.join(&relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path).fs_context("creating directory", &out_path)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).fs_context("creating directory", parent)?;
        }
        let mut out = File::create(&out_path).fs_context("creating file", &out_path)?;
        io::copy(&mut entry, &mut out).fs_context("extracting file", &out_path)?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&out_path, std::fs::Permissions::from_mode(mode & 0o777))
                .fs_context("setting permissions", &out_path)?;
        }
    }

    Ok(zip.len())
}

/// Normalises a validated entry name into a relative path.
fn relative_entry_path(name: &str) -> PathBuf {
    name.split(['/', '\\'])
        .filter(|c| !c.is_empty() && *c != ".")
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_relative_names_are_accepted() {
        for name in ["app.py", "pkg/mod.py", "pkg/", "./app.py", "a/..b/c", "dots..py"] {
            assert!(validate_entry_name(name).is_ok(), "{name} should be accepted");
        }
    }

    #[test]
    fn absolute_and_parent_names_are_rejected() {
        for name in [
            "/etc/passwd",
            "\\windows\\evil.dll",
            "C:\\evil.py",
            "c:/evil.py",
            "../escape.py",
            "pkg/../../escape.py",
            "pkg\\..\\..\\escape.py",
            "pkg/..",
        ] {
            let err = validate_entry_name(name).unwrap_err();
            assert!(
                matches!(err, Error::PathTraversal { .. }),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn entry_paths_are_normalised() {
        assert_eq!(relative_entry_path("./pkg//mod.py"), PathBuf::from("pkg").join("mod.py"));
        assert_eq!(relative_entry_path("pkg\\data.txt"), PathBuf::from("pkg").join("data.txt"));
        assert!(relative_entry_path("./").as_os_str().is_empty());
    }
}
