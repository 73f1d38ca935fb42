//! Build Plan
//!
//! Everything Gradle needs to produce one signed artifact: task name,
//! injected signing properties and the expected output location.

use std::path::{Component, Path, PathBuf};
use serde::{Serialize, Serializer};
use tracing::{debug, warn};

use droidpack_core::{BuildVariant, Descriptor};

use crate::BuildError;

/// Artifact type (APK or AAB)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    #[default]
    Apk,
    Bundle,
}

impl ArtifactKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Apk => "apk",
            ArtifactKind::Bundle => "aab",
        }
    }

    /// Directory under `build/outputs/` Gradle writes this artifact to
    pub fn output_dir(&self) -> &'static str {
        match self {
            ArtifactKind::Apk => "apk",
            ArtifactKind::Bundle => "bundle",
        }
    }

    pub fn gradle_task(&self, variant: &BuildVariant) -> String {
        let suffix = variant.gradle_task_suffix();
        match self {
            ArtifactKind::Apk => format!("assemble{}", suffix),
            ArtifactKind::Bundle => format!("bundle{}", suffix),
        }
    }
}

/// Planning options that do not come from the descriptor
#[derive(Debug, Clone)]
pub struct PlanOptions {
    pub artifact: ArtifactKind,
    /// Gradle module holding the application (default: app)
    pub module: String,
    /// Gradle root project; defaults to the descriptor's directory
    pub project_dir: Option<PathBuf>,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            artifact: ArtifactKind::Apk,
            module: "app".to_string(),
            project_dir: None,
        }
    }
}

/// A `-P` property passed to Gradle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GradleProperty {
    pub key: String,
    #[serde(serialize_with = "redact_if_secret")]
    value: PropertyValue,
}

#[derive(Clone, PartialEq, Eq)]
enum PropertyValue {
    Plain(String),
    Secret(String),
}

impl std::fmt::Debug for PropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyValue::Plain(value) => write!(f, "{:?}", value),
            PropertyValue::Secret(_) => f.write_str("\"***\""),
        }
    }
}

fn redact_if_secret<S: Serializer>(value: &PropertyValue, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        PropertyValue::Plain(value) => serializer.serialize_str(value),
        PropertyValue::Secret(_) => serializer.serialize_str("***"),
    }
}

impl GradleProperty {
    pub fn plain(key: &str, value: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            value: PropertyValue::Plain(value.into()),
        }
    }

    pub fn secret(key: &str, value: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            value: PropertyValue::Secret(value.into()),
        }
    }

    pub fn is_secret(&self) -> bool {
        matches!(self.value, PropertyValue::Secret(_))
    }

    /// Raw value, as handed to Gradle
    pub fn value(&self) -> &str {
        match &self.value {
            PropertyValue::Plain(value) | PropertyValue::Secret(value) => value,
        }
    }

    /// `-Pkey=value` argument
    pub fn to_arg(&self) -> String {
        format!("-P{}={}", self.key, self.value())
    }

    /// `-Pkey=value` argument safe for logs
    pub fn to_display_arg(&self) -> String {
        if self.is_secret() {
            format!("-P{}=***", self.key)
        } else {
            self.to_arg()
        }
    }
}

/// Build plan for one variant
#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
    /// Application ID including the variant suffix
    pub application_id: String,
    pub version_code: u32,
    /// Version name including the variant suffix
    pub version_name: String,
    pub variant: BuildVariant,
    pub artifact: ArtifactKind,
    pub project_dir: PathBuf,
    pub module: String,
    /// Fully qualified task, e.g. `:app:assembleRelease`
    pub task: String,
    pub properties: Vec<GradleProperty>,
    /// Where Gradle writes the artifact
    pub output_path: PathBuf,
}

impl BuildPlan {
    /// Plan a build of `variant`, revealing its signing credentials
    pub fn new(descriptor: &Descriptor, variant: BuildVariant, options: PlanOptions) -> Result<Self, BuildError> {
        let project_dir = options
            .project_dir
            .unwrap_or_else(|| descriptor.project_dir.clone());

        let application_id = match &variant.application_id_suffix {
            Some(suffix) => format!("{}{}", descriptor.application_id, suffix),
            None => descriptor.application_id.clone(),
        };
        let version_name = match &variant.version_name_suffix {
            Some(suffix) => format!("{}{}", descriptor.version.name, suffix),
            None => descriptor.version.name.clone(),
        };

        let task = format!(":{}:{}", options.module, options.artifact.gradle_task(&variant));

        let signing = &variant.signing;
        if !signing.keystore_exists() {
            warn!("Keystore for signing profile {} not found at {:?}", signing.name, signing.store_file);
        }
        let properties = vec![
            GradleProperty::plain(
                "android.injected.signing.store.file",
                signing.store_file.to_string_lossy(),
            ),
            GradleProperty::secret("android.injected.signing.store.password", signing.store_password.reveal()?),
            GradleProperty::plain("android.injected.signing.key.alias", signing.key_alias.clone()),
            GradleProperty::secret(
                "android.injected.signing.key.password",
                signing.effective_key_password().reveal()?,
            ),
        ];

        let file_name = format!("{}-{}.{}", options.module, variant.as_str(), options.artifact.extension());
        let build_dir = match &descriptor.flutter_source {
            // The Flutter Gradle plugin moves every module's build dir to
            // `<flutter root>/build/<module>`.
            Some(source) => normalize(&descriptor.project_dir.join(source))
                .join("build")
                .join(&options.module),
            None => project_dir.join(&options.module).join("build"),
        };
        let output_path = build_dir
            .join("outputs")
            .join(options.artifact.output_dir())
            .join(variant.as_str())
            .join(file_name);

        debug!("Planned {} -> {:?}", task, output_path);

        Ok(Self {
            application_id,
            version_code: descriptor.version.code,
            version_name,
            variant,
            artifact: options.artifact,
            project_dir,
            module: options.module,
            task,
            properties,
            output_path,
        })
    }

    /// Plan with default options
    pub fn for_variant(descriptor: &Descriptor, name: &str) -> Result<Self, BuildError> {
        let variant = descriptor.resolve(name)?;
        Self::new(descriptor, variant, PlanOptions::default())
    }

    /// Render as pretty JSON; secrets are redacted
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Fold `.` and `name/..` pairs without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir if matches!(out.components().next_back(), Some(Component::Normal(_))) => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}
