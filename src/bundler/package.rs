//! Copying the bundle next to the source and zipping it.

use super::{
    error::{Error, ErrorExt, Result},
    events::Reporter,
    utils::fs,
};
use crate::source::OutputLocation;
use std::{
    fs::File,
    io::{self, BufWriter},
    path::{Path, PathBuf},
};
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

/// Where the packaged output ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagedOutput {
    pub dir: PathBuf,
    pub archive: PathBuf,
}

/// Copies `bundle` to `<parent>/<base>_onedir` and zips that copy to
/// `<parent>/<base>_onedir.zip`.
///
/// Existing outputs at either path are replaced, so packaging the same
/// project twice leaves exactly one folder and one archive.
pub async fn package(
    bundle: &Path,
    location: &OutputLocation,
    reporter: &Reporter,
) -> Result<PackagedOutput> {
    let dir = location.onedir_dir();
    let archive = location.archive_path();

    fs::remove_dir_all(&dir).await?;
    fs::copy_dir(bundle, &dir).await?;
    reporter.log(format!("Copied bundle to {}", dir.display()));

    fs::remove_file(&archive).await?;
    let entries = zip_dir(&dir, &archive).await?;
    reporter.log(format!("Wrote {} ({} entries)", archive.display(), entries));

    Ok(PackagedOutput { dir, archive })
}

/// Zips the contents of `src` into a new archive at `dest`.
///
/// Entry names are relative to `src` and use `/` separators. Entries are
/// written in sorted order; unix permissions and symlinks are recorded.
/// Returns the number of entries written.
pub async fn zip_dir(src: &Path, dest: &Path) -> Result<usize> {
    let src = src.to_path_buf();
    let dest = dest.to_path_buf();

    tokio::task::spawn_blocking(move || write_zip(&src, &dest))
        .await
        .map_err(|e| Error::GenericError(format!("Archive task panicked: {}", e)))?
}

fn write_zip(src: &Path, dest: &Path) -> Result<usize> {
    let file = File::create(dest).fs_context("creating archive", dest)?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let base = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut count = 0;

    for entry in walkdir::WalkDir::new(src).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let name = entry_name(entry.path().strip_prefix(src)?);
        let options = base.unix_permissions(unix_mode(&entry));

        if entry.file_type().is_symlink() {
            let target =
                std::fs::read_link(entry.path()).fs_context("reading symlink", entry.path())?;
            zip.add_symlink(name, target.to_string_lossy().replace('\\', "/"), options)?;
        } else if entry.file_type().is_dir() {
            zip.add_directory(name, options)?;
        } else {
            zip.start_file(name, options)?;
            let mut input = File::open(entry.path()).fs_context("opening file", entry.path())?;
            io::copy(&mut input, &mut zip).fs_context("archiving file", entry.path())?;
        }
        count += 1;
    }

    zip.finish()?;
    Ok(count)
}

fn entry_name(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(unix)]
fn unix_mode(entry: &walkdir::DirEntry) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    entry
        .metadata()
        .map(|m| m.permissions().mode() & 0o7777)
        .unwrap_or(0o644)
}

#[cfg(not(unix))]
fn unix_mode(entry: &walkdir::DirEntry) -> u32 {
    if entry.file_type().is_dir() { 0o755 } else { 0o644 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn sample_bundle(root: &Path) -> PathBuf {
        let bundle = root.join("dist_out").join("app");
        std::fs::create_dir_all(bundle.join("_internal").join("lib")).unwrap();
        std::fs::write(bundle.join("app"), "binary").unwrap();
        std::fs::write(bundle.join("_internal").join("lib").join("base.zip"), "data").unwrap();
        bundle
    }

    #[tokio::test]
    async fn writes_folder_and_archive_next_to_source() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = sample_bundle(dir.path());
        let location = OutputLocation::new(dir.path(), "hello");
        let (reporter, _rx) = Reporter::channel();

        let out = package(&bundle, &location, &reporter).await.unwrap();

        assert_eq!(out.dir, dir.path().join("hello_onedir"));
        assert_eq!(out.archive, dir.path().join("hello_onedir.zip"));
        assert!(out.dir.join("app").is_file());

        let mut archive = zip::ZipArchive::new(File::open(&out.archive).unwrap()).unwrap();
        let mut names: Vec<_> = archive.file_names().map(String::from).collect();
        names.sort();
        assert_eq!(
            names,
            vec!["_internal/", "_internal/lib/", "_internal/lib/base.zip", "app"]
        );

        let mut contents = String::new();
        archive
            .by_name("_internal/lib/base.zip")
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "data");
    }

    #[tokio::test]
    async fn repackaging_replaces_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = sample_bundle(dir.path());
        let location = OutputLocation::new(dir.path(), "hello");
        let (reporter, _rx) = Reporter::channel();

        package(&bundle, &location, &reporter).await.unwrap();
        std::fs::write(location.onedir_dir().join("stale.txt"), "x").unwrap();
        let out = package(&bundle, &location, &reporter).await.unwrap();

        assert!(!out.dir.join("stale.txt").exists());
        let archive = zip::ZipArchive::new(File::open(&out.archive).unwrap()).unwrap();
        assert_eq!(archive.len(), 4);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn preserves_modes_and_symlinks() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("run"), "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(src.join("run"), std::fs::Permissions::from_mode(0o755)).unwrap();
        std::os::unix::fs::symlink("run", src.join("alias")).unwrap();

        let dest = dir.path().join("out.zip");
        assert_eq!(zip_dir(&src, &dest).await.unwrap(), 2);

        let mut archive = zip::ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        let mode = archive.by_name("run").unwrap().unix_mode().unwrap();
        assert_eq!(mode & 0o777, 0o755);
        assert!(archive.by_name("alias").unwrap().is_symlink());
    }
}
