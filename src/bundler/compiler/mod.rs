//! Running the bundler inside a provisioned environment.
//!
//! The compile step turns a validated project root into a one-directory
//! bundle under `dist_out/`. Everything it passes to the bundler is derived
//! from the project layout and the request options; see [`CompilePlan`].

mod add_data;
mod artifact;

pub use add_data::{parse_add_data, to_bundler_directive};
pub use artifact::locate_bundle;

use super::{
    environment::BuildEnvironment,
    error::{Error, ErrorExt, Result},
    events::Reporter,
    process::{describe_status, run_streaming},
    settings::{BUNDLER_MODULE, BuildOptions, ProjectLayout},
    utils::fs,
};
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};
use tokio_util::sync::CancellationToken;

/// Arguments for one bundler run, after the interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilePlan {
    target: PathBuf,
    uses_spec: bool,
    ignored_flags: Vec<&'static str>,
    args: Vec<OsString>,
}

impl CompilePlan {
    /// Derives the bundler arguments for `layout` and `options`.
    ///
    /// A spec file at the project root replaces the entry point as target.
    /// The bundler refuses makespec options alongside a spec file, so the
    /// console, icon and data flags are only added for entry-point builds.
    pub async fn prepare(layout: &ProjectLayout, options: &BuildOptions) -> Result<Self> {
        let spec = layout.bundler_spec();
        let uses_spec = is_file(&spec).await;
        let target = if uses_spec { spec } else { layout.entry_point() };

        let mut args: Vec<OsString> = vec![
            "-m".into(),
            BUNDLER_MODULE.into(),
            "--clean".into(),
            "--noconfirm".into(),
            "--distpath".into(),
            layout.dist_dir().into_os_string(),
            "--workpath".into(),
            layout.build_dir().into_os_string(),
        ];

        let mut ignored_flags = Vec::new();
        if uses_spec {
            if options.hide_console {
                ignored_flags.push("--noconsole");
            }
            if options.icon.is_some() {
                ignored_flags.push("--icon");
            }
        } else {
            if options.hide_console {
                args.push("--noconsole".into());
            }

            if let Some(icon) = resolve_icon(layout, options).await {
                args.push("--icon".into());
                args.push(icon.into_os_string());
            }

            let manifest = layout.add_data_manifest();
            if is_file(&manifest).await {
                let contents = tokio::fs::read_to_string(&manifest)
                    .await
                    .fs_context("reading data manifest", &manifest)?;
                for line in parse_add_data(&contents) {
                    args.push("--add-data".into());
                    args.push(to_bundler_directive(&line).into());
                }
            }
        }

        args.push(target.clone().into_os_string());

        Ok(Self {
            target,
            uses_spec,
            ignored_flags,
            args,
        })
    }

    /// File handed to the bundler.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Whether the target is a spec file.
    pub fn uses_spec(&self) -> bool {
        self.uses_spec
    }

    /// Requested flags that a spec file overrides.
    pub fn ignored_flags(&self) -> &[&'static str] {
        &self.ignored_flags
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }
}

/// The request's icon if given, else the project's conventional icon if present.
async fn resolve_icon(layout: &ProjectLayout, options: &BuildOptions) -> Option<PathBuf> {
    if let Some(icon) = &options.icon {
        return Some(icon.clone());
    }
    let icon = layout.icon();
    is_file(&icon).await.then_some(icon)
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

/// Runs the bundler for `layout` and returns its one-directory output.
///
/// `dist_out/` and `build_out/` are cleared first so stale output from an
/// earlier run can never be mistaken for this one's.
///
/// # Errors
///
/// - [`Error::CompilerError`] when the bundler exits non-zero
/// - [`Error::ArtifactNotFound`] when it succeeds without producing a bundle
/// - [`Error::Cancelled`] when `cancel` fires mid-run
pub async fn compile(
    layout: &ProjectLayout,
    env: &BuildEnvironment,
    options: &BuildOptions,
    reporter: &Reporter,
    cancel: &CancellationToken,
) -> Result<PathBuf> {
    fs::remove_dir_all(&layout.dist_dir()).await?;
    fs::remove_dir_all(&layout.build_dir()).await?;

    let plan = CompilePlan::prepare(layout, options).await?;
    if plan.uses_spec() {
        reporter.log(format!(
            "Using {}; console, icon and data options come from the spec file.",
            plan.target().display()
        ));
    }
    if !plan.ignored_flags().is_empty() {
        reporter.warn(format!(
            "{} ignored because {} defines the bundle settings.",
            plan.ignored_flags().join(" and "),
            plan.target().display()
        ));
    }

    let args = plan.args();
    let status = run_streaming(env.python(), args, Some(layout.root()), reporter, cancel).await?;
    if !status.success() {
        return Err(Error::CompilerError {
            command: env.python().display_with(args),
            status: describe_status(status),
        });
    }

    let bundle = locate_bundle(&layout.dist_dir(), layout.bundle_name()).await?;
    reporter.log(format!("Bundle created: {}", bundle.display()));
    Ok(bundle)
}
