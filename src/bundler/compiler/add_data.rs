//! Data-inclusion manifest parsing.

/// Separator between source and destination in manifest lines.
pub const MANIFEST_SEPARATOR: char = ';';

/// Returns the include directives in a manifest, one per usable line.
///
/// Lines are trimmed; blank lines and lines without a separator are skipped.
pub fn parse_add_data(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && line.contains(MANIFEST_SEPARATOR))
        .map(String::from)
        .collect()
}

/// Rewrites a manifest directive into the form the bundler expects on this
/// host, whose separator follows the platform path-list separator.
pub fn to_bundler_directive(line: &str) -> String {
    if cfg!(windows) {
        line.to_string()
    } else {
        line.replacen(MANIFEST_SEPARATOR, ":", 1)
    }
}
