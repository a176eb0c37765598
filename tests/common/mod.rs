//! Common test utilities for pyonedir integration tests

use std::{
    io::Write,
    path::{Path, PathBuf},
};
use tempfile::TempDir;

/// A scratch directory holding projects, archives and fake interpreters
#[allow(dead_code)]
pub struct TestWorkspace {
    /// Temporary directory
    pub temp: TempDir,
    /// Path to workspace root
    pub path: PathBuf,
}

#[allow(dead_code)]
impl TestWorkspace {
    /// Create a new test workspace
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().to_path_buf();
        Self { temp, path }
    }

    /// Write a file in workspace, creating parent directories
    pub fn write_file(&self, path: &str, content: &str) -> PathBuf {
        let file_path = self.path.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    /// Create a project directory with the given files
    pub fn create_project(&self, name: &str, files: &[(&str, &str)]) -> PathBuf {
        let root = self.path.join(name);
        std::fs::create_dir_all(&root).expect("Failed to create project directory");
        for (rel, content) in files {
            self.write_file(&format!("{name}/{rel}"), content);
        }
        root
    }

    /// Write a zip archive whose entries are stored verbatim, unsafe names included
    pub fn write_zip(&self, name: &str, entries: &[(&str, &str)]) -> PathBuf {
        let path = self.path.join(name);
        let file = std::fs::File::create(&path).expect("Failed to create archive");
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        for (entry, content) in entries {
            zip.start_file(*entry, options).expect("Failed to start entry");
            zip.write_all(content.as_bytes()).expect("Failed to write entry");
        }
        zip.finish().expect("Failed to finish archive");
        path
    }

    /// Write a fake interpreter script and return its path
    #[cfg(unix)]
    pub fn fake_python(&self, name: &str, behaviour: FakePython) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.path.join("bin").join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, behaviour.script()).expect("Failed to write fake python");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// Sorted relative paths of every file and directory under `dir`
    pub fn tree(dir: &Path) -> Vec<String> {
        let mut entries: Vec<String> = walkdir::WalkDir::new(dir)
            .min_depth(1)
            .into_iter()
            .map(|e| {
                e.unwrap()
                    .path()
                    .strip_prefix(dir)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        entries.sort();
        entries
    }
}

/// How a fake interpreter behaves
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, Default)]
pub struct FakePython {
    /// `-m venv` exits non-zero
    pub venv_fails: bool,
    /// `-m pip install -r ...` exits non-zero
    pub requirements_fail: bool,
    /// `-m PyInstaller` exits non-zero
    pub bundler_fails: bool,
}

#[allow(dead_code)]
impl FakePython {
    pub fn working() -> Self {
        Self::default()
    }

    pub fn without_venv() -> Self {
        Self {
            venv_fails: true,
            ..Self::default()
        }
    }

    /// A POSIX shell stand-in for `python`.
    ///
    /// `-m venv DIR` copies the script to `DIR/bin/python`, `-m pip` echoes
    /// its arguments, and `-m PyInstaller` creates `<distpath>/app/app`.
    /// The copy keeps every knob, since the environment runs pip through it.
    fn script(self) -> String {
        let venv_exit = if self.venv_fails {
            "echo 'Error: ensurepip is not available' >&2; exit 1"
        } else {
            "mkdir -p \"$1/bin\" && cp \"$0\" \"$1/bin/python\" && chmod +x \"$1/bin/python\"; echo \"created $1\"; exit 0"
        };
        let bundler_exit = if self.bundler_fails {
            "echo 'ERROR: script not found' >&2; exit 1"
        } else {
            "mkdir -p \"$dist/app/_internal\"; printf 'bundle' > \"$dist/app/app\"; chmod +x \"$dist/app/app\"; printf 'lib' > \"$dist/app/_internal/base_library.zip\"; echo 'Building COLLECT' >&2; exit 0"
        };

        let pip_exit = if self.requirements_fail {
            "case \" $* \" in *\" -r \"*) echo 'ERROR: No matching distribution found for nosuchpkg' >&2; exit 1;; esac; exit 0"
        } else {
            "exit 0"
        };

        format!(
            r#"#!/bin/sh
if [ "$1" = "--version" ]; then
  echo "Python 3.11.7"
  exit 0
fi
if [ "$1" = "-m" ]; then
  module="$2"
  shift 2
  case "$module" in
    venv)
      {venv_exit}
      ;;
    pip)
      echo "pip $*"
      {pip_exit}
      ;;
    PyInstaller)
      dist=""
      while [ $# -gt 0 ]; do
        if [ "$1" = "--distpath" ]; then
          dist="$2"
          shift
        fi
        shift
      done
      {bundler_exit}
      ;;
  esac
fi
echo "unsupported invocation: $*" >&2
exit 2
"#
        )
    }
}

/// Get a command for the pyonedir binary with the environment cleared of
/// interpreter overrides
#[allow(dead_code)]
#[allow(deprecated)]
pub fn pyonedir_cmd() -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::cargo_bin("pyonedir").unwrap();
    cmd.env_remove("PYONEDIR_PYTHON");
    cmd
}
