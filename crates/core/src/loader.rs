//! Descriptor Loader
//!
//! Parses a `droidpack.toml` descriptor into a [`Descriptor`].
//!
//! Required fields are checked explicitly so the error names the exact
//! dotted key that is missing rather than a serde position.

use std::path::{Path, PathBuf};
use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, info};

use crate::descriptor::{validate_identifier, AppVersion, CompileOptions, Descriptor, SdkBounds};
use crate::error::{DescriptorError, Result};
use crate::signing::{CredentialRef, SigningProfile, DEBUG_PROFILE};
use crate::variant::{RuleFile, VariantDecl, DEBUG_VARIANT, RELEASE_VARIANT};

/// The default descriptor file name.
pub const DESCRIPTOR_FILE_NAME: &str = "droidpack.toml";

/// Where a descriptor comes from
#[derive(Debug, Clone)]
pub enum DescriptorSource {
    /// A descriptor file on disk
    File(PathBuf),
    /// Descriptor text, with the directory relative paths resolve against
    Inline { contents: String, base_dir: PathBuf },
}

impl DescriptorSource {
    /// Inline source anchored at the current directory
    pub fn inline(contents: impl Into<String>) -> Self {
        DescriptorSource::Inline {
            contents: contents.into(),
            base_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDescriptor {
    #[serde(default)]
    plugins: Vec<String>,
    flutter_source: Option<PathBuf>,
    app: Option<RawApp>,
    sdk: Option<RawSdk>,
    compile_options: Option<CompileOptions>,
    #[serde(default)]
    signing: IndexMap<String, RawSigning>,
    #[serde(default)]
    variants: IndexMap<String, RawVariant>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawApp {
    application_id: Option<String>,
    namespace: Option<String>,
    version_code: Option<i64>,
    version_name: Option<String>,
    version: Option<String>,
    ndk_version: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSdk {
    min: Option<i64>,
    target: Option<i64>,
    compile: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSigning {
    store_file: Option<PathBuf>,
    store_password: Option<CredentialRef>,
    key_alias: Option<String>,
    key_password: Option<CredentialRef>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawVariant {
    debuggable: Option<bool>,
    #[serde(default)]
    minify: bool,
    #[serde(default)]
    shrink_resources: bool,
    signing: Option<String>,
    default_proguard_file: Option<String>,
    #[serde(default)]
    proguard_files: Vec<PathBuf>,
    application_id_suffix: Option<String>,
    version_name_suffix: Option<String>,
}

/// Loads descriptors from files or strings
pub struct DescriptorLoader {
    file_name: String,
}

impl Default for DescriptorLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DescriptorLoader {
    /// Create a loader looking for `droidpack.toml`
    pub fn new() -> Self {
        Self {
            file_name: DESCRIPTOR_FILE_NAME.to_string(),
        }
    }

    /// Load a descriptor from `source`
    pub fn load(&self, source: &DescriptorSource) -> Result<Descriptor> {
        match source {
            DescriptorSource::File(path) => self.load_file(path),
            DescriptorSource::Inline { contents, base_dir } => self.parse(contents, base_dir),
        }
    }

    /// Load a descriptor file; relative paths inside it resolve against
    /// the file's directory
    pub fn load_file(&self, path: &Path) -> Result<Descriptor> {
        info!("Loading descriptor from {:?}", path);
        let contents = std::fs::read_to_string(path).map_err(|source| DescriptorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        self.parse(&contents, base_dir)
    }

    /// Search `start_dir` and its ancestors for the descriptor file
    pub fn discover(&self, start_dir: &Path) -> Option<PathBuf> {
        let found = start_dir
            .ancestors()
            .map(|dir| dir.join(&self.file_name))
            .find(|candidate| candidate.is_file());
        debug!("Descriptor discovery from {:?}: {:?}", start_dir, found);
        found
    }

    /// Parse descriptor text
    pub fn parse(&self, contents: &str, base_dir: impl AsRef<Path>) -> Result<Descriptor> {
        let base_dir = base_dir.as_ref();
        let raw: RawDescriptor = toml::from_str(contents)?;
        let app = raw.app.unwrap_or_default();
        let sdk = raw.sdk.unwrap_or_default();

        let application_id = app
            .application_id
            .ok_or_else(|| DescriptorError::missing("app.application_id"))?;
        validate_identifier("app.application_id", &application_id)?;

        let namespace = app.namespace.unwrap_or_else(|| application_id.clone());
        validate_identifier("app.namespace", &namespace)?;

        let version = build_version(app.version_code, app.version_name, app.version.as_deref())?;

        let sdk = SdkBounds::new(
            required_u32("sdk.min", sdk.min)?,
            required_u32("sdk.target", sdk.target)?,
            required_u32("sdk.compile", sdk.compile)?,
        )?;

        let signing_profiles = build_signing_profiles(raw.signing, base_dir)?;
        let variants = build_variants(raw.variants, base_dir)?;

        for decl in variants.values() {
            if let Some(profile) = &decl.signing {
                if !signing_profiles.contains_key(profile) {
                    return Err(DescriptorError::UnknownSigningProfile {
                        variant: decl.name.clone(),
                        profile: profile.clone(),
                    });
                }
            }
        }

        let descriptor = Descriptor {
            application_id,
            namespace,
            version,
            sdk,
            ndk_version: app.ndk_version,
            compile_options: raw.compile_options.unwrap_or_default(),
            plugins: raw.plugins,
            flutter_source: raw.flutter_source,
            project_dir: base_dir.to_path_buf(),
            signing_profiles,
            variants,
        };

        info!(
            "Loaded {} {} ({}), {} variant(s)",
            descriptor.application_id,
            descriptor.version.name,
            descriptor.version.code,
            descriptor.variants.len()
        );
        Ok(descriptor)
    }
}

fn required_u32(field: &'static str, value: Option<i64>) -> Result<u32> {
    let value = value.ok_or_else(|| DescriptorError::missing(field))?;
    u32::try_from(value).map_err(|_| DescriptorError::invalid(field, format!("{} is out of range", value)))
}

fn build_version(code: Option<i64>, name: Option<String>, shorthand: Option<&str>) -> Result<AppVersion> {
    // The shorthand only fills gaps; a fully explicit version never parses it.
    let (short_name, short_code) = match shorthand {
        Some(value) if code.is_none() || name.is_none() => AppVersion::split_shorthand(value)?,
        _ => (String::new(), None),
    };

    let code = match code {
        Some(code) => required_u32("app.version_code", Some(code))?,
        None => short_code.ok_or_else(|| DescriptorError::missing("app.version_code"))?,
    };

    let name = match name {
        Some(name) => name,
        None if !short_name.is_empty() => short_name,
        None => return Err(DescriptorError::missing("app.version_name")),
    };

    AppVersion::new(code, &name)
}

fn build_signing_profiles(
    raw: IndexMap<String, RawSigning>,
    base_dir: &Path,
) -> Result<IndexMap<String, SigningProfile>> {
    let mut profiles = IndexMap::new();
    if !raw.contains_key(DEBUG_PROFILE) {
        profiles.insert(DEBUG_PROFILE.to_string(), SigningProfile::debug());
    }

    for (name, entry) in raw {
        let field = |key: &str| format!("signing.{}.{}", name, key);

        let store_file = entry.store_file.ok_or_else(|| DescriptorError::missing(field("store_file")))?;
        let store_password = entry
            .store_password
            .ok_or_else(|| DescriptorError::missing(field("store_password")))?;
        let key_alias = entry.key_alias.ok_or_else(|| DescriptorError::missing(field("key_alias")))?;

        let mut profile = SigningProfile::new(&name, store_file, store_password, &key_alias).rebase(base_dir);
        if let Some(key_password) = entry.key_password {
            profile = profile.with_key_password(key_password);
        }
        profiles.insert(name, profile);
    }

    Ok(profiles)
}

fn build_variants(raw: IndexMap<String, RawVariant>, base_dir: &Path) -> Result<IndexMap<String, VariantDecl>> {
    let mut variants = IndexMap::new();
    variants.insert(DEBUG_VARIANT.to_string(), VariantDecl::debug());
    variants.insert(RELEASE_VARIANT.to_string(), VariantDecl::release());

    for (name, entry) in raw {
        if !is_variant_name(&name) {
            return Err(DescriptorError::invalid(
                format!("variants.{}", name),
                "variant names must start with a lowercase letter and be alphanumeric",
            ));
        }
        if entry.shrink_resources && !entry.minify {
            return Err(DescriptorError::invalid(
                format!("variants.{}.shrink_resources", name),
                "resource shrinking requires minify",
            ));
        }

        let mut decl = match variants.shift_remove(&name) {
            Some(implicit) => implicit,
            None => VariantDecl::custom(&name),
        };

        if let Some(debuggable) = entry.debuggable {
            decl.debuggable = debuggable;
        }
        decl.minify = entry.minify;
        decl.shrink_resources = entry.shrink_resources;
        if entry.signing.is_some() {
            decl.signing = entry.signing;
        }
        decl.rule_files = entry
            .default_proguard_file
            .into_iter()
            .map(RuleFile::SdkDefault)
            .chain(entry.proguard_files.into_iter().map(|p| RuleFile::Project(base_dir.join(p))))
            .collect();
        decl.application_id_suffix = entry.application_id_suffix;
        decl.version_name_suffix = entry.version_name_suffix;

        variants.insert(name, decl);
    }

    // Keep the implicit build types first regardless of declaration order.
    for implicit in [RELEASE_VARIANT, DEBUG_VARIANT] {
        if let Some(index) = variants.get_index_of(implicit) {
            variants.move_index(index, 0);
        }
    }

    Ok(variants)
}

fn is_variant_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase()) && chars.all(|c| c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
plugins = ["com.android.application", "com.google.gms.google-services", "kotlin-android", "dev.flutter.flutter-gradle-plugin"]
flutter_source = "../.."

[app]
namespace = "com.example.walkinsalonapp"
application_id = "com.example.walkinsalonapp"
version_code = 7
version_name = "2.0.1"
ndk_version = "27.0.12077973"

[sdk]
min = 21
target = 36
compile = 36

[compile_options]
source_compatibility = "11"
target_compatibility = "11"
jvm_target = "11"

[signing.release]
store_file = "debug.keystore"
store_password = "android"
key_alias = "androiddebugkey"
key_password = "android"

[variants.release]
minify = false
shrink_resources = false
signing = "release"
default_proguard_file = "proguard-android-optimize.txt"
proguard_files = ["proguard-rules.pro"]
"#;

    const MINIMAL: &str = r#"
[app]
application_id = "com.example.app"
version_code = 3
version_name = "1.2.0"

[sdk]
min = 21
target = 34
compile = 34
"#;

    fn parse(contents: &str) -> Result<Descriptor> {
        DescriptorLoader::new().parse(contents, "/project/android/app")
    }

    fn without_line(contents: &str, prefix: &str) -> String {
        contents
            .lines()
            .filter(|line| !line.trim_start().starts_with(prefix))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_load_scenario() {
        let descriptor = parse(MINIMAL).unwrap();
        assert_eq!(descriptor.application_id, "com.example.app");
        assert_eq!(descriptor.namespace, "com.example.app");
        assert_eq!(descriptor.version.code, 3);
        assert_eq!(descriptor.version.name, "1.2.0");
        assert_eq!(descriptor.sdk, SdkBounds { min: 21, target: 34, compile: 34 });
        assert_eq!(descriptor.compile_options, CompileOptions::default());
    }

    #[test]
    fn test_load_full_sample() {
        let descriptor = parse(SAMPLE).unwrap();
        assert_eq!(descriptor.namespace, "com.example.walkinsalonapp");
        assert_eq!(descriptor.ndk_version.as_deref(), Some("27.0.12077973"));
        assert_eq!(descriptor.plugins.len(), 4);
        assert_eq!(descriptor.plugins[3], "dev.flutter.flutter-gradle-plugin");
        assert_eq!(descriptor.flutter_source, Some(PathBuf::from("../..")));
        assert_eq!(
            descriptor.signing_profiles.keys().collect::<Vec<_>>(),
            vec!["debug", "release"]
        );
        assert_eq!(
            descriptor.signing_profiles["release"].store_file,
            PathBuf::from("/project/android/app/debug.keystore")
        );
    }

    #[test]
    fn test_missing_required_fields() {
        let cases = [
            ("application_id", "app.application_id"),
            ("version_code", "app.version_code"),
            ("version_name", "app.version_name"),
            ("min", "sdk.min"),
            ("target", "sdk.target"),
            ("compile", "sdk.compile"),
        ];
        for (key, field) in cases {
            let contents = without_line(MINIMAL, &format!("{} =", key));
            match parse(&contents) {
                Err(DescriptorError::MissingField(name)) => assert_eq!(name, field),
                other => panic!("expected MissingField({}), got {:?}", field, other),
            }
        }
    }

    #[test]
    fn test_missing_sections() {
        let err = parse("plugins = []").unwrap_err();
        assert!(matches!(err, DescriptorError::MissingField(f) if f == "app.application_id"));

        let no_sdk = MINIMAL.split("[sdk]").next().unwrap();
        let err = parse(no_sdk).unwrap_err();
        assert!(matches!(err, DescriptorError::MissingField(f) if f == "sdk.min"));
    }

    #[test]
    fn test_version_shorthand() {
        let contents = MINIMAL
            .replace("version_code = 3\n", "")
            .replace("version_name = \"1.2.0\"", "version = \"1.2.0+3\"");
        let descriptor = parse(&contents).unwrap();
        assert_eq!(descriptor.version, AppVersion { code: 3, name: "1.2.0".into() });

        // Explicit fields win over the shorthand.
        let contents = MINIMAL.replace("version_name = \"1.2.0\"", "version = \"9.9.9+99\"\nversion_name = \"1.2.0\"");
        let descriptor = parse(&contents).unwrap();
        assert_eq!(descriptor.version, AppVersion { code: 3, name: "1.2.0".into() });

        // A shorthand without build number still needs a code.
        let contents = MINIMAL
            .replace("version_code = 3\n", "")
            .replace("version_name = \"1.2.0\"", "version = \"1.2.0\"");
        assert!(matches!(parse(&contents), Err(DescriptorError::MissingField(f)) if f == "app.version_code"));
    }

    #[test]
    fn test_malformed_shorthand_ignored_when_explicit() {
        let contents = MINIMAL.replace("version_name = \"1.2.0\"", "version_name = \"1.2.0\"\nversion = \"1.2.0+beta\"");
        let descriptor = parse(&contents).unwrap();
        assert_eq!(descriptor.version, AppVersion { code: 3, name: "1.2.0".into() });

        // Still rejected when the shorthand has to supply the code.
        let contents = contents.replace("version_code = 3\n", "");
        assert_eq!(parse(&contents).unwrap_err().field(), Some("app.version"));
    }

    #[test]
    fn test_invalid_namespace() {
        let contents = MINIMAL.replace(
            "application_id = \"com.example.app\"",
            "application_id = \"com.example.app\"\nnamespace = \"example-app\"",
        );
        match parse(&contents) {
            Err(DescriptorError::InvalidField { field, reason }) => {
                assert_eq!(field, "app.namespace");
                assert!(reason.contains("example-app"));
            }
            other => panic!("expected InvalidField(app.namespace), got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_values() {
        let err = parse(&MINIMAL.replace("min = 21", "min = 35")).unwrap_err();
        assert_eq!(err.field(), Some("sdk.min"));

        let err = parse(&MINIMAL.replace("version_code = 3", "version_code = -1")).unwrap_err();
        assert_eq!(err.field(), Some("app.version_code"));

        let err = parse(&MINIMAL.replace("com.example.app", "example")).unwrap_err();
        assert_eq!(err.field(), Some("app.application_id"));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = parse(&MINIMAL.replace("version_code = 3", "version_code = 3\nversionCode = 3")).unwrap_err();
        assert!(matches!(err, DescriptorError::Parse(_)));
    }

    #[test]
    fn test_shrink_requires_minify() {
        let contents = format!("{}\n[variants.release]\nshrink_resources = true\n", MINIMAL);
        let err = parse(&contents).unwrap_err();
        assert_eq!(err.field(), Some("variants.release.shrink_resources"));
    }

    #[test]
    fn test_undeclared_signing_profile() {
        let contents = format!("{}\n[variants.release]\nsigning = \"upload\"\n", MINIMAL);
        assert!(matches!(
            parse(&contents),
            Err(DescriptorError::UnknownSigningProfile { variant, profile }) if variant == "release" && profile == "upload"
        ));
    }

    #[test]
    fn test_incomplete_signing_profile() {
        let contents = format!("{}\n[signing.release]\nstore_file = \"r.jks\"\nkey_alias = \"a\"\n", MINIMAL);
        assert!(matches!(
            parse(&contents),
            Err(DescriptorError::MissingField(f)) if f == "signing.release.store_password"
        ));
    }

    #[test]
    fn test_variant_order_keeps_implicit_first() {
        let contents = format!(
            "{}\n[variants.staging]\nsigning = \"debug\"\n\n[variants.release]\nminify = true\n",
            MINIMAL
        );
        let descriptor = parse(&contents).unwrap();
        assert_eq!(
            descriptor.variants.keys().collect::<Vec<_>>(),
            vec!["debug", "release", "staging"]
        );
        assert!(descriptor.variants["release"].minify);
    }

    #[test]
    fn test_invalid_variant_name() {
        let contents = format!("{}\n[variants.Staging]\n", MINIMAL);
        assert_eq!(parse(&contents).unwrap_err().field(), Some("variants.Staging"));
    }

    #[test]
    fn test_check_upgrade() {
        let previous = parse(MINIMAL).unwrap();

        let next = parse(&MINIMAL.replace("version_code = 3", "version_code = 4")).unwrap();
        assert!(next.check_upgrade(&previous).is_ok());

        assert!(matches!(
            previous.check_upgrade(&previous),
            Err(DescriptorError::VersionCodeNotIncreasing { previous: 3, current: 3 })
        ));

        let renamed = parse(
            &MINIMAL
                .replace("com.example.app", "com.example.other")
                .replace("version_code = 3", "version_code = 4"),
        )
        .unwrap();
        assert!(matches!(
            renamed.check_upgrade(&previous),
            Err(DescriptorError::IdentifierChanged { .. })
        ));
    }

    #[test]
    fn test_load_file_and_discover() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("android").join("app");
        std::fs::create_dir_all(&nested).unwrap();
        let path = dir.path().join(DESCRIPTOR_FILE_NAME);
        std::fs::write(&path, SAMPLE).unwrap();

        let loader = DescriptorLoader::new();
        assert_eq!(loader.discover(&nested), Some(path.clone()));

        let descriptor = loader.load(&DescriptorSource::File(path)).unwrap();
        assert_eq!(descriptor.project_dir, dir.path());
        assert_eq!(
            descriptor.signing_profiles["release"].store_file,
            dir.path().join("debug.keystore")
        );
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = DescriptorLoader::new()
            .load(&DescriptorSource::File(dir.path().join("nope.toml")))
            .unwrap_err();
        assert!(matches!(err, DescriptorError::Io { .. }));
    }

    #[test]
    fn test_inline_source() {
        let descriptor = DescriptorLoader::new().load(&DescriptorSource::inline(MINIMAL)).unwrap();
        assert_eq!(descriptor.project_dir, PathBuf::from("."));
    }
}
