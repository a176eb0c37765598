//! Build orchestration and coordination.
//!
//! This module provides the [`Builder`] orchestrator that takes one
//! [`BuildRequest`](crate::bundler::BuildRequest) through every pipeline
//! phase, and the [`BuildWorker`] that runs it on a dedicated thread.
//!
//! # Overview
//!
//! A build:
//! 1. Resolves the source to a project root
//! 2. Locates an interpreter and provisions an isolated environment
//! 3. Installs the bundler and the project's requirements
//! 4. Runs the bundler and locates its output
//! 5. Copies and zips the output, then reports its size and checksum
//!
//! # Example
//!
//! ```no_run
//! use pyonedir::bundler::{BuildEvent, BuildRequestBuilder, BuildWorker, Builder};
//!
//! # async fn example() -> pyonedir::bundler::Result<()> {
//! let request = BuildRequestBuilder::new().source("projects/hello").build()?;
//! let handle = BuildWorker::spawn(Builder::new(request))?;
//!
//! let outcome = handle
//!     .wait_with(|event| {
//!         if let BuildEvent::Progress(p) = event {
//!             println!("{p}%");
//!         }
//!     })
//!     .await;
//!
//! if let Some(artifact) = outcome.artifact() {
//!     println!("Created: {} ({} bytes)", artifact.archive.display(), artifact.archive_size);
//!     println!("SHA256: {}", artifact.archive_sha256);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`checksum`] - SHA256 checksum calculation for archives
//! - [`orchestrator`] - Main [`Builder`] struct and phase sequencing
//! - [`outcome`] - [`BuildOutcome`] and its variants
//! - [`worker`] - [`BuildWorker`] and [`BuildHandle`]

mod checksum;
mod orchestrator;
mod outcome;
mod worker;

pub use checksum::calculate_sha256;
pub use orchestrator::Builder;
pub use outcome::{BuildArtifact, BuildFailure, BuildOutcome};
pub use worker::{BuildHandle, BuildWorker};
