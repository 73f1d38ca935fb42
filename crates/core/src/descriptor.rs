//! Application Descriptor
//!
//! The static identity of an Android application: identifier, SDK
//! bounds, version, compile options and the signing profiles and build
//! variants it declares.

use std::path::PathBuf;
use std::sync::OnceLock;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{DescriptorError, Result};
use crate::resolver::VariantResolver;
use crate::signing::SigningProfile;
use crate::variant::{BuildVariant, VariantDecl};

/// Application version (Android `versionCode` + `versionName`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppVersion {
    /// Monotonic integer version used by the store
    pub code: u32,
    /// Human readable version
    pub name: String,
}

impl AppVersion {
    /// Create a version, rejecting a zero code or empty name
    pub fn new(code: u32, name: &str) -> Result<Self> {
        if code == 0 {
            return Err(DescriptorError::invalid("app.version_code", "must be at least 1"));
        }
        if name.trim().is_empty() {
            return Err(DescriptorError::invalid("app.version_name", "must not be empty"));
        }
        Ok(Self {
            code,
            name: name.to_string(),
        })
    }

    /// Split a pubspec-style `name+code` string.
    ///
    /// `"1.2.0+3"` yields `("1.2.0", Some(3))`; without a `+` the code is
    /// absent.
    pub fn split_shorthand(value: &str) -> Result<(String, Option<u32>)> {
        match value.split_once('+') {
            Some((name, code)) => {
                let code = code.trim().parse::<u32>().map_err(|_| {
                    DescriptorError::invalid("app.version", format!("build number `{}` is not a number", code))
                })?;
                Ok((name.trim().to_string(), Some(code)))
            }
            None => Ok((value.trim().to_string(), None)),
        }
    }
}

/// Platform SDK bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkBounds {
    pub min: u32,
    pub target: u32,
    pub compile: u32,
}

impl SdkBounds {
    /// Create SDK bounds, enforcing `1 <= min <= target <= compile`
    pub fn new(min: u32, target: u32, compile: u32) -> Result<Self> {
        if min == 0 {
            return Err(DescriptorError::invalid("sdk.min", "must be at least 1"));
        }
        if min > target {
            return Err(DescriptorError::invalid(
                "sdk.min",
                format!("{} is above target SDK {}", min, target),
            ));
        }
        if target > compile {
            return Err(DescriptorError::invalid(
                "sdk.target",
                format!("{} is above compile SDK {}", target, compile),
            ));
        }
        Ok(Self { min, target, compile })
    }
}

/// Java / Kotlin compilation targets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompileOptions {
    pub source_compatibility: String,
    pub target_compatibility: String,
    pub jvm_target: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            source_compatibility: "11".to_string(),
            target_compatibility: "11".to_string(),
            jvm_target: "11".to_string(),
        }
    }
}

/// Loaded application descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Descriptor {
    /// Application ID (e.g., com.example.myapp)
    pub application_id: String,
    /// Code namespace (defaults to the application ID)
    pub namespace: String,
    pub version: AppVersion,
    pub sdk: SdkBounds,
    /// Pinned NDK version
    pub ndk_version: Option<String>,
    pub compile_options: CompileOptions,
    /// Gradle plugin ids, in application order
    pub plugins: Vec<String>,
    /// Flutter module root, relative to the project directory
    pub flutter_source: Option<PathBuf>,
    /// Directory the descriptor was loaded from
    pub project_dir: PathBuf,
    /// Declared signing profiles, including the implicit debug profile
    pub signing_profiles: IndexMap<String, SigningProfile>,
    /// Declared build variants, in declaration order
    pub variants: IndexMap<String, VariantDecl>,
}

impl Descriptor {
    /// Resolve a build variant by name
    pub fn resolve(&self, variant: &str) -> Result<BuildVariant> {
        VariantResolver::new(self).resolve(variant)
    }

    /// Check that `self` is a valid successor release of `previous`
    pub fn check_upgrade(&self, previous: &Descriptor) -> Result<()> {
        if self.application_id != previous.application_id {
            return Err(DescriptorError::IdentifierChanged {
                previous: previous.application_id.clone(),
                current: self.application_id.clone(),
            });
        }
        if self.version.code <= previous.version.code {
            return Err(DescriptorError::VersionCodeNotIncreasing {
                previous: previous.version.code,
                current: self.version.code,
            });
        }
        Ok(())
    }
}

fn reverse_domain() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9_]*(\.[A-Za-z][A-Za-z0-9_]*)+$")
            .expect("reverse-domain pattern is valid")
    })
}

/// Validate a reverse-domain identifier such as `com.example.app`
pub fn validate_identifier(field: &str, value: &str) -> Result<()> {
    if reverse_domain().is_match(value) {
        Ok(())
    } else {
        Err(DescriptorError::invalid(
            field,
            format!("`{}` is not a reverse-domain identifier", value),
        ))
    }
}
