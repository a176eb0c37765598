//! Build source resolution.
//!
//! Turns the archive or directory a caller hands us into a validated
//! [`ProjectRoot`], and decides where the finished bundle is written.

mod archive;

pub use archive::{extract_zip, validate_entry_name};

use crate::bundler::{
    error::{Error, ErrorExt, Result},
    settings::{ENTRY_POINT, ONEDIR_SUFFIX, ProjectLayout},
};
use path_absolutize::Absolutize;
use std::path::{Path, PathBuf};

/// Directory name archives are extracted into, under the build's work root.
const EXTRACT_DIR: &str = "proj";

/// What a build was started from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildSource {
    /// A `.zip` archive containing the project.
    Archive(PathBuf),
    /// A project directory used in place.
    Directory(PathBuf),
}

impl BuildSource {
    /// Classifies `path` as an archive or directory source.
    ///
    /// The path is made absolute so the output location does not depend on
    /// the working directory of the worker.
    pub fn from_path(path: &Path) -> Result<Self> {
        let path = path
            .absolutize()
            .fs_context("resolving source path", path)?
            .into_owned();

        if path.is_dir() {
            return Ok(Self::Directory(path));
        }

        if !path.exists() {
            return Err(Error::InvalidSource {
                path,
                reason: "path does not exist".to_string(),
            });
        }

        let is_zip = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("zip"));

        if path.is_file() && is_zip {
            Ok(Self::Archive(path))
        } else {
            Err(Error::InvalidSource {
                path,
                reason: "expected a project directory or a .zip archive".to_string(),
            })
        }
    }

    /// Returns the source path.
    pub fn path(&self) -> &Path {
        match self {
            Self::Archive(path) | Self::Directory(path) => path,
        }
    }

    /// Returns `true` for archive sources.
    pub fn is_archive(&self) -> bool {
        matches!(self, Self::Archive(_))
    }

    /// Where the copied bundle and its archive are written.
    ///
    /// Archives put their output next to themselves, named after the archive
    /// without its extension. Directories put it inside themselves, named
    /// after the directory.
    pub fn output_location(&self) -> Result<OutputLocation> {
        let (parent, name) = match self {
            Self::Archive(path) => (path.parent(), path.file_stem()),
            Self::Directory(path) => (Some(path.as_path()), path.file_name()),
        };

        match (parent, name.and_then(|n| n.to_str())) {
            (Some(parent), Some(name)) if !name.is_empty() => Ok(OutputLocation {
                parent: parent.to_path_buf(),
                base_name: name.to_string(),
            }),
            _ => Err(Error::InvalidSource {
                path: self.path().to_path_buf(),
                reason: "cannot derive an output name from this path".to_string(),
            }),
        }
    }

    /// Resolves the source into a validated project root.
    ///
    /// Archives are extracted under `work_root`, which the caller owns and
    /// removes once the build is over.
    pub async fn resolve(&self, work_root: &Path) -> Result<ProjectRoot> {
        let base = match self {
            Self::Archive(archive) => {
                let dest = work_root.join(EXTRACT_DIR);
                let count = extract_zip(archive, &dest).await?;
                log::info!("Extracted {} entries to {}", count, dest.display());
                dest
            }
            Self::Directory(dir) => dir.clone(),
        };

        let root = detect_project_root(&base).await?;
        ProjectRoot::validate(root).await
    }
}

/// Destination of the packaged output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLocation {
    parent: PathBuf,
    base_name: String,
}

impl OutputLocation {
    pub fn new(parent: impl Into<PathBuf>, base_name: impl Into<String>) -> Self {
        Self {
            parent: parent.into(),
            base_name: base_name.into(),
        }
    }

    pub fn parent(&self) -> &Path {
        &self.parent
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// `<parent>/<base>_onedir`
    pub fn onedir_dir(&self) -> PathBuf {
        self.parent.join(format!("{}{}", self.base_name, ONEDIR_SUFFIX))
    }

    /// `<parent>/<base>_onedir.zip`
    pub fn archive_path(&self) -> PathBuf {
        self.parent.join(format!("{}{}.zip", self.base_name, ONEDIR_SUFFIX))
    }
}

/// A directory known to contain the entry point.
#[derive(Debug, Clone)]
pub struct ProjectRoot {
    layout: ProjectLayout,
}

impl ProjectRoot {
    /// Checks that the entry point exists at `root`.
    pub async fn validate(root: PathBuf) -> Result<Self> {
        let layout = ProjectLayout::new(root);
        if !is_file(&layout.entry_point()).await {
            return Err(Error::MissingEntrypoint {
                root: layout.root().to_path_buf(),
                entry_point: ENTRY_POINT.to_string(),
            });
        }
        Ok(Self { layout })
    }

    pub fn path(&self) -> &Path {
        self.layout.root()
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }
}

/// Finds the directory holding the entry point.
///
/// Checks `dir` itself, then its immediate subdirectories in name order.
/// Falls back to `dir` when neither has it; validation reports the miss.
pub async fn detect_project_root(dir: &Path) -> Result<PathBuf> {
    if is_file(&dir.join(ENTRY_POINT)).await {
        return Ok(dir.to_path_buf());
    }

    let mut entries = tokio::fs::read_dir(dir)
        .await
        .fs_context("reading project directory", dir)?;

    let mut subdirs = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .fs_context("reading project directory", dir)?
    {
        let is_dir = entry
            .file_type()
            .await
            .map(|t| t.is_dir())
            .unwrap_or(false);
        if is_dir {
            subdirs.push(entry.path());
        }
    }
    subdirs.sort();

    for subdir in subdirs {
        if is_file(&subdir.join(ENTRY_POINT)).await {
            log::debug!("Entry point found one level down in {}", subdir.display());
            return Ok(subdir);
        }
    }

    Ok(dir.to_path_buf())
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::ErrorKind;

    #[test]
    fn archive_output_sits_next_to_archive() {
        let source = BuildSource::Archive(PathBuf::from("/home/me/builds/tool.zip"));
        let out = source.output_location().unwrap();
        assert_eq!(out.parent(), Path::new("/home/me/builds"));
        assert_eq!(out.base_name(), "tool");
        assert_eq!(out.onedir_dir(), Path::new("/home/me/builds/tool_onedir"));
        assert_eq!(out.archive_path(), Path::new("/home/me/builds/tool_onedir.zip"));
    }

    #[test]
    fn directory_output_sits_inside_directory() {
        let source = BuildSource::Directory(PathBuf::from("/home/me/tool"));
        let out = source.output_location().unwrap();
        assert_eq!(out.onedir_dir(), Path::new("/home/me/tool/tool_onedir"));
        assert_eq!(out.archive_path(), Path::new("/home/me/tool/tool_onedir.zip"));
    }

    #[test]
    fn non_zip_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("project.tar");
        std::fs::write(&file, b"not a zip").unwrap();
        let err = BuildSource::from_path(&file).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSource);
    }

    #[test]
    fn zip_extension_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Project.ZIP");
        std::fs::write(&file, b"PK").unwrap();
        assert!(BuildSource::from_path(&file).unwrap().is_archive());
    }

    #[tokio::test]
    async fn root_is_used_when_entry_point_is_there() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(ENTRY_POINT), "print('hi')").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join(ENTRY_POINT), "").unwrap();

        let root = detect_project_root(dir.path()).await.unwrap();
        assert_eq!(root, dir.path());
    }

    #[tokio::test]
    async fn first_nested_directory_in_name_order_wins() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["zeta", "alpha"] {
            let sub = dir.path().join(name);
            std::fs::create_dir(&sub).unwrap();
            std::fs::write(sub.join(ENTRY_POINT), "").unwrap();
        }

        let root = detect_project_root(dir.path()).await.unwrap();
        assert_eq!(root, dir.path().join("alpha"));
    }

    #[tokio::test]
    async fn two_levels_deep_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let deep = dir.path().join("a").join("b");
        std::fs::create_dir_all(&deep).unwrap();
        std::fs::write(deep.join(ENTRY_POINT), "").unwrap();

        let source = BuildSource::Directory(dir.path().to_path_buf());
        let work = tempfile::tempdir().unwrap();
        let err = source.resolve(work.path()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingEntrypoint);
    }

    #[tokio::test]
    async fn entry_point_directory_does_not_count() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(ENTRY_POINT)).unwrap();
        let err = ProjectRoot::validate(dir.path().to_path_buf())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingEntrypoint);
    }
}
