//! Build pipeline: from a Python project to a zipped one-directory bundle.
//!
//! # Module Organization
//!
//! - [`settings`] - build requests, options and project layout names
//! - [`interpreter`] - locating a usable Python interpreter
//! - [`environment`] - isolated build environments
//! - [`compiler`] - running the bundler
//! - [`package`] - copying and zipping the output
//! - [`builder`] - phase orchestration and the worker thread
//! - [`events`] - progress and log events for front-ends

pub mod builder;
pub mod compiler;
pub mod environment;
pub mod error;
pub mod events;
pub mod interpreter;
pub mod package;
pub mod process;
pub mod settings;
pub mod utils;

pub use builder::{
    BuildArtifact, BuildFailure, BuildHandle, BuildOutcome, BuildWorker, Builder, calculate_sha256,
};
pub use environment::BuildEnvironment;
pub use error::{Context, Error, ErrorExt, ErrorKind, Result};
pub use events::{BuildEvent, BuildPhase, Reporter};
pub use interpreter::{CandidateSource, InterpreterCandidate, InterpreterLocator};
pub use process::Invocation;
pub use settings::{BuildOptions, BuildRequest, BuildRequestBuilder, ProjectLayout};
