//! Conventional file names and directories inside a project root.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Program entry point; must exist at the project root.
pub const ENTRY_POINT: &str = "app.py";

/// Optional dependency manifest, one requirement per line.
pub const REQUIREMENTS: &str = "requirements.txt";

/// Optional bundler spec file, used instead of the entry point when present.
pub const BUNDLER_SPEC: &str = "pyinstaller.spec";

/// Optional icon picked up when the request does not name one.
pub const ICON_FILE: &str = "icon.ico";

/// Optional data-inclusion manifest with `source;dest` lines.
pub const ADD_DATA_MANIFEST: &str = "build_add_data.txt";

/// Bundler output directory, relative to the project root.
pub const DIST_DIR: &str = "dist_out";

/// Bundler work directory, relative to the project root.
pub const BUILD_WORK_DIR: &str = "build_out";

/// Isolated environment directory, relative to the build's work root.
pub const ENV_DIR: &str = ".venv_build";

/// Suffix appended to the base name of the copied output folder and archive.
pub const ONEDIR_SUFFIX: &str = "_onedir";

/// Package installed into the environment to provide the bundler.
pub const BUNDLER_PACKAGE: &str = "pyinstaller";

/// Module name the bundler is run as (`python -m PyInstaller`).
pub const BUNDLER_MODULE: &str = "PyInstaller";

/// Supported interpreter minor versions of Python 3, oldest first.
pub const SUPPORTED_MINORS: std::ops::RangeInclusive<u32> = 10..=12;

/// Upper bound for a single `--version` probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(15);

/// Paths the pipeline reads or writes under one project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entry_point(&self) -> PathBuf {
        self.root.join(ENTRY_POINT)
    }

    pub fn requirements(&self) -> PathBuf {
        self.root.join(REQUIREMENTS)
    }

    pub fn bundler_spec(&self) -> PathBuf {
        self.root.join(BUNDLER_SPEC)
    }

    pub fn icon(&self) -> PathBuf {
        self.root.join(ICON_FILE)
    }

    pub fn add_data_manifest(&self) -> PathBuf {
        self.root.join(ADD_DATA_MANIFEST)
    }

    pub fn dist_dir(&self) -> PathBuf {
        self.root.join(DIST_DIR)
    }

    pub fn build_dir(&self) -> PathBuf {
        self.root.join(BUILD_WORK_DIR)
    }

    /// Name of the bundle directory the bundler derives from the entry point.
    pub fn bundle_name(&self) -> &'static str {
        ENTRY_POINT.trim_end_matches(".py")
    }
}
