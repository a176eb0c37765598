//! Configuration structures for build requests.
//!
//! A [`BuildRequest`] is assembled once per build (usually through
//! [`BuildRequestBuilder`]) and is immutable afterwards. [`ProjectLayout`]
//! names every file and directory the pipeline reads or writes under a
//! project root.

mod builder;
mod layout;
mod options;
mod request;

pub use builder::BuildRequestBuilder;
pub use layout::{
    ADD_DATA_MANIFEST, BUILD_WORK_DIR, BUNDLER_MODULE, BUNDLER_PACKAGE, BUNDLER_SPEC,
    DIST_DIR, ENTRY_POINT, ENV_DIR, ICON_FILE, ONEDIR_SUFFIX, PROBE_TIMEOUT, ProjectLayout,
    REQUIREMENTS, SUPPORTED_MINORS,
};
pub use options::BuildOptions;
pub use request::BuildRequest;
