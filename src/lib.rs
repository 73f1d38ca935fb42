//! droidpack - Android packaging descriptor tool
//!
//! Loads a declarative packaging descriptor (application identity, SDK
//! bounds, signing profiles, build variants), resolves a build variant
//! and drives Gradle to produce the signed artifact.
//!
//! ## Architecture
//!
//! - `droidpack-core`: descriptor model, loader and variant resolver
//! - `droidpack-build-engine`: build planning and Gradle invocation
//! - `droidpack` (this crate): command layer used by the CLI

#![warn(clippy::all)]

pub mod commands;

pub use droidpack_build_engine::{BuildError, BuildPlan};
pub use droidpack_core::{BuildVariant, Descriptor, DescriptorError};

use tracing_subscriber::EnvFilter;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging; `RUST_LOG` wins over the verbosity flag
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A second initialisation (e.g. from tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
