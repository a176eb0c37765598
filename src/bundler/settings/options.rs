//! User-facing bundler options.

use std::path::PathBuf;

/// Options passed through to the bundler.
///
/// # Examples
///
/// ```
/// use pyonedir::bundler::BuildOptions;
///
/// let options = BuildOptions {
///     hide_console: true,
///     ..Default::default()
/// };
/// assert!(options.icon.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Build a windowed executable with no console (`--noconsole`).
    pub hide_console: bool,

    /// Icon for the produced executable.
    ///
    /// When unset, `icon.ico` at the project root is used if present.
    pub icon: Option<PathBuf>,
}
