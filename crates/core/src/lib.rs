//! droidpack Core - descriptor model, loader and variant resolver
//!
//! This crate reads an Android packaging descriptor into a typed
//! [`Descriptor`] and binds named build variants to their signing profiles.

pub mod descriptor;
pub mod error;
pub mod loader;
pub mod resolver;
pub mod signing;
pub mod variant;

pub use descriptor::{AppVersion, CompileOptions, Descriptor, SdkBounds};
pub use error::{DescriptorError, Result};
pub use loader::{DescriptorLoader, DescriptorSource, DESCRIPTOR_FILE_NAME};
pub use resolver::VariantResolver;
pub use signing::{CredentialRef, SigningProfile};
pub use variant::{BuildVariant, RuleFile, VariantDecl};

/// droidpack version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
