//! droidpack Build Engine
//!
//! Turns a resolved build variant into a Gradle invocation that produces
//! a signed APK or App Bundle.

pub mod gradle;
pub mod plan;

pub use gradle::GradleInvocation;
pub use plan::{ArtifactKind, BuildPlan, GradleProperty, PlanOptions};

use std::path::PathBuf;

/// Build errors
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Build failed: {0}")]
    BuildFailed(String),
    #[error("Toolchain not found: {0}")]
    ToolchainNotFound(String),
    #[error("Expected build output missing: {0:?}")]
    ArtifactMissing(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Descriptor(#[from] droidpack_core::DescriptorError),
}
