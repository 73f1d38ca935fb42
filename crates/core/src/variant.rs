//! Build Variants
//!
//! Declared build types and their fully bound form.

use std::fmt;
use std::path::PathBuf;
use serde::Serialize;

use crate::signing::{SigningProfile, DEBUG_PROFILE};

pub const DEBUG_VARIANT: &str = "debug";
pub const RELEASE_VARIANT: &str = "release";

/// Optimization rule file fed to R8/ProGuard
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "file")]
pub enum RuleFile {
    /// A default file shipped with the Android Gradle plugin
    /// (`getDefaultProguardFile(...)`)
    SdkDefault(String),
    /// A file inside the project
    Project(PathBuf),
}

impl fmt::Display for RuleFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleFile::SdkDefault(name) => write!(f, "<sdk>/{}", name),
            RuleFile::Project(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A build variant as declared, before its signing profile is bound
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantDecl {
    pub name: String,
    pub debuggable: bool,
    /// Code shrinking / obfuscation (`isMinifyEnabled`)
    pub minify: bool,
    /// Resource shrinking (`isShrinkResources`)
    pub shrink_resources: bool,
    /// Name of the signing profile this variant signs with
    pub signing: Option<String>,
    pub rule_files: Vec<RuleFile>,
    pub application_id_suffix: Option<String>,
    pub version_name_suffix: Option<String>,
}

impl VariantDecl {
    /// The implicit `debug` build type
    pub fn debug() -> Self {
        Self {
            name: DEBUG_VARIANT.to_string(),
            debuggable: true,
            minify: false,
            shrink_resources: false,
            signing: Some(DEBUG_PROFILE.to_string()),
            rule_files: Vec::new(),
            application_id_suffix: None,
            version_name_suffix: None,
        }
    }

    /// The implicit `release` build type (no signing bound)
    pub fn release() -> Self {
        Self {
            name: RELEASE_VARIANT.to_string(),
            debuggable: false,
            signing: None,
            ..Self::debug()
        }
    }

    /// A blank custom build type
    pub fn custom(name: &str) -> Self {
        Self {
            name: name.to_string(),
            debuggable: false,
            signing: None,
            ..Self::debug()
        }
    }
}

/// A build variant with its signing profile bound
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildVariant {
    pub name: String,
    pub debuggable: bool,
    pub minify: bool,
    pub shrink_resources: bool,
    pub signing: SigningProfile,
    pub rule_files: Vec<RuleFile>,
    pub application_id_suffix: Option<String>,
    pub version_name_suffix: Option<String>,
}

impl BuildVariant {
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// Variant name as it appears in Gradle task names (`release` -> `Release`)
    pub fn gradle_task_suffix(&self) -> String {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}
