//! Isolated build environments.
//!
//! Every build gets a fresh virtual environment created by the located
//! interpreter. The bundler and the project's requirements are installed into
//! it, never into the host interpreter.

use super::{
    error::{Error, Result},
    events::Reporter,
    process::{Invocation, describe_status, run_streaming},
    settings::{BUNDLER_PACKAGE, ProjectLayout},
    utils::fs,
};
use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};
use tokio_util::sync::CancellationToken;

/// Interpreter locations inside an environment, Windows layout first.
const ENV_INTERPRETERS: [&str; 2] = ["Scripts/python.exe", "bin/python"];

/// A provisioned virtual environment.
#[derive(Debug, Clone)]
pub struct BuildEnvironment {
    root: PathBuf,
    python: Invocation,
    pip: Invocation,
}

/// Creates a fresh environment at `target` using `interpreter`.
///
/// Any existing directory at `target` is removed first. A failing `venv` run
/// is reported as [`Error::EnvironmentCreationFailed`] so the caller can try
/// another interpreter.
pub async fn provision(
    interpreter: &Invocation,
    target: &Path,
    reporter: &Reporter,
    cancel: &CancellationToken,
) -> Result<BuildEnvironment> {
    fs::remove_dir_all(target).await?;

    let creation_failed = |reason: String| Error::EnvironmentCreationFailed {
        interpreter: interpreter.to_string(),
        path: target.to_path_buf(),
        reason,
    };

    let args: [&OsStr; 3] = [OsStr::new("-m"), OsStr::new("venv"), target.as_os_str()];
    let status = match run_streaming(interpreter, args, None, reporter, cancel).await {
        Ok(status) => status,
        Err(Error::CommandFailed { error, .. }) => return Err(creation_failed(error.to_string())),
        Err(e) => return Err(e),
    };
    if !status.success() {
        return Err(creation_failed(format!("venv {}", describe_status(status))));
    }

    let python = environment_interpreter(target)
        .ok_or_else(|| creation_failed("environment has no interpreter".to_string()))?;
    reporter.log(format!("Environment ready: {}", target.display()));

    Ok(BuildEnvironment::new(target.to_path_buf(), python))
}

/// Finds the interpreter inside an environment directory.
pub fn environment_interpreter(root: &Path) -> Option<PathBuf> {
    ENV_INTERPRETERS
        .iter()
        .map(|rel| root.join(rel))
        .find(|path| path.is_file())
}

impl BuildEnvironment {
    pub fn new(root: PathBuf, python: PathBuf) -> Self {
        let pip = Invocation::with_prefix(&python, ["-m", "pip"]);
        Self {
            root,
            python: Invocation::new(python),
            pip,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The environment's own interpreter.
    pub fn python(&self) -> &Invocation {
        &self.python
    }

    /// The environment's package installer (`python -m pip`).
    pub fn pip(&self) -> &Invocation {
        &self.pip
    }

    /// Upgrades pip, wheel and setuptools.
    ///
    /// Failure is only a warning: the versions shipped with `venv` can still
    /// install everything on most hosts, and offline hosts cannot upgrade.
    pub async fn install_tooling(
        &self,
        reporter: &Reporter,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let args = ["install", "--upgrade", "pip", "wheel", "setuptools"];
        let status = run_streaming(&self.pip, args, None, reporter, cancel).await?;
        if !status.success() {
            log::warn!("Packaging tool upgrade {}", describe_status(status));
            reporter.log(format!(
                "Warning: upgrading packaging tools {}; continuing with bundled versions.",
                describe_status(status)
            ));
        }
        Ok(())
    }

    /// Installs the bundler into the environment.
    pub async fn install_bundler(
        &self,
        reporter: &Reporter,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let args = ["install", BUNDLER_PACKAGE];
        let status = run_streaming(&self.pip, args, None, reporter, cancel).await?;
        if !status.success() {
            return Err(Error::DependencyInstallFailed {
                command: self.pip.display_with(args),
                status: describe_status(status),
            });
        }
        Ok(())
    }

    /// Installs the project's requirements manifest if it has one.
    ///
    /// Returns `false` when there is no manifest, which is not an error: the
    /// project may only need the standard library.
    pub async fn install_requirements(
        &self,
        layout: &ProjectLayout,
        reporter: &Reporter,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        let manifest = layout.requirements();
        if !manifest.is_file() {
            reporter.log(format!(
                "No {} found; continuing with the standard library only.",
                manifest
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            ));
            return Ok(false);
        }

        let args: [&OsStr; 3] = [OsStr::new("install"), OsStr::new("-r"), manifest.as_os_str()];
        let status = run_streaming(&self.pip, args, Some(layout.root()), reporter, cancel).await?;
        if !status.success() {
            return Err(Error::DependencyInstallFailed {
                command: self.pip.display_with(args),
                status: describe_status(status),
            });
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pip_runs_through_the_environment_interpreter() {
        let env = BuildEnvironment::new(PathBuf::from("/env"), PathBuf::from("/env/bin/python"));
        assert_eq!(env.python().to_string(), "/env/bin/python");
        assert_eq!(env.pip().to_string(), "/env/bin/python -m pip");
    }

    #[test]
    fn finds_posix_and_windows_layouts() {
        let dir = tempfile::tempdir().unwrap();
        assert!(environment_interpreter(dir.path()).is_none());

        std::fs::create_dir_all(dir.path().join("bin")).unwrap();
        std::fs::write(dir.path().join("bin").join("python"), "").unwrap();
        assert_eq!(
            environment_interpreter(dir.path()),
            Some(dir.path().join("bin/python"))
        );

        std::fs::create_dir_all(dir.path().join("Scripts")).unwrap();
        std::fs::write(dir.path().join("Scripts").join("python.exe"), "").unwrap();
        assert_eq!(
            environment_interpreter(dir.path()),
            Some(dir.path().join("Scripts/python.exe"))
        );
    }

    #[tokio::test]
    async fn missing_manifest_is_an_advisory() {
        let project = tempfile::tempdir().unwrap();
        let (reporter, _rx) = Reporter::channel();
        let env = BuildEnvironment::new(PathBuf::from("/env"), PathBuf::from("/env/bin/python"));

        let installed = env
            .install_requirements(
                &ProjectLayout::new(project.path()),
                &reporter,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(!installed);
        assert!(reporter.transcript()[0].contains("No requirements.txt found"));
    }

    #[tokio::test]
    async fn unstartable_interpreter_is_a_creation_failure() {
        let dir = tempfile::tempdir().unwrap();
        let (reporter, _rx) = Reporter::channel();
        let err = provision(
            &Invocation::new("/no/such/python3"),
            &dir.path().join("env"),
            &reporter,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::EnvironmentCreationFailed { .. }));
    }
}
