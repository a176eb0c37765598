//! Builder for constructing a [`BuildRequest`].

use super::{BuildOptions, BuildRequest};
use crate::{
    bundler::error::{Error, ErrorExt, Result},
    source::BuildSource,
};
use path_absolutize::Absolutize;
use std::path::{Path, PathBuf};

/// Builder for constructing [`BuildRequest`].
///
/// # Examples
///
/// ```no_run
/// use pyonedir::bundler::BuildRequestBuilder;
///
/// # fn example() -> pyonedir::bundler::Result<()> {
/// let request = BuildRequestBuilder::new()
///     .source("projects/hello.zip")
///     .hide_console(true)
///     .icon("assets/hello.ico")
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct BuildRequestBuilder {
    source: Option<PathBuf>,
    options: BuildOptions,
    interpreters: Vec<PathBuf>,
}

impl BuildRequestBuilder {
    /// Creates a new request builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the archive or project directory to build.
    ///
    /// # Required
    ///
    /// This field is required for building.
    pub fn source<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.source = Some(path.as_ref().to_path_buf());
        self
    }

    /// Hides the console window of the produced executable.
    ///
    /// Default: `false`
    pub fn hide_console(mut self, hide: bool) -> Self {
        self.options.hide_console = hide;
        self
    }

    /// Sets the icon passed to the bundler.
    ///
    /// Default: `icon.ico` at the project root, if present
    pub fn icon<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.options.icon = Some(path.as_ref().to_path_buf());
        self
    }

    /// Adds an interpreter to try before any discovered one.
    ///
    /// May be called repeatedly; interpreters are tried in insertion order.
    pub fn interpreter<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.interpreters.push(path.as_ref().to_path_buf());
        self
    }

    /// Builds the request.
    ///
    /// # Errors
    ///
    /// - no source was set
    /// - the source is neither an existing directory nor a `.zip` file
    /// - an icon was given that does not exist
    pub fn build(mut self) -> Result<BuildRequest> {
        use crate::bundler::error::Context;

        let source = self.source.context("source is required")?;
        let source = BuildSource::from_path(&source)?;

        // The bundler runs inside the project root, so relative icons would
        // resolve against the wrong directory.
        if let Some(icon) = self.options.icon.take() {
            let icon = icon
                .absolutize()
                .fs_context("resolving icon path", &icon)?
                .into_owned();
            if !icon.is_file() {
                return Err(Error::GenericError(format!(
                    "icon file not found: {}",
                    icon.display()
                )));
            }
            self.options.icon = Some(icon);
        }

        Ok(BuildRequest::new(source, self.options, self.interpreters))
    }
}
