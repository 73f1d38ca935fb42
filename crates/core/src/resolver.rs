//! Variant Resolver
//!
//! Selects a declared build variant and binds its signing profile.

use tracing::debug;

use crate::descriptor::Descriptor;
use crate::error::{DescriptorError, Result};
use crate::variant::BuildVariant;

/// Resolves build variants against a loaded descriptor
pub struct VariantResolver<'a> {
    descriptor: &'a Descriptor,
}

impl<'a> VariantResolver<'a> {
    pub fn new(descriptor: &'a Descriptor) -> Self {
        Self { descriptor }
    }

    /// Declared variant names, in declaration order
    pub fn variant_names(&self) -> Vec<&'a str> {
        self.descriptor.variants.keys().map(String::as_str).collect()
    }

    /// Resolve `name` into a fully bound variant
    pub fn resolve(&self, name: &str) -> Result<BuildVariant> {
        let decl = self.descriptor.variants.get(name).ok_or_else(|| {
            DescriptorError::UnknownVariant {
                name: name.to_string(),
                declared: self.variant_names().join(", "),
            }
        })?;

        let profile_name = decl
            .signing
            .as_deref()
            .ok_or_else(|| DescriptorError::UnboundSigningProfile(name.to_string()))?;

        // The loader rejects dangling references, so a miss here means the
        // descriptor was assembled by hand.
        let signing = self
            .descriptor
            .signing_profiles
            .get(profile_name)
            .cloned()
            .ok_or_else(|| DescriptorError::UnknownSigningProfile {
                variant: name.to_string(),
                profile: profile_name.to_string(),
            })?;

        debug!("Resolved variant {} with signing profile {}", name, profile_name);

        Ok(BuildVariant {
            name: decl.name.clone(),
            debuggable: decl.debuggable,
            minify: decl.minify,
            shrink_resources: decl.shrink_resources,
            signing,
            rule_files: decl.rule_files.clone(),
            application_id_suffix: decl.application_id_suffix.clone(),
            version_name_suffix: decl.version_name_suffix.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::DescriptorLoader;
    use crate::variant::RuleFile;

    const BASE: &str = r#"
[app]
application_id = "com.example.app"
version_code = 3
version_name = "1.2.0"

[sdk]
min = 21
target = 34
compile = 34
"#;

    fn load(extra: &str) -> Descriptor {
        DescriptorLoader::new().parse(&format!("{}{}", BASE, extra), ".").unwrap()
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let descriptor = load(
            r#"
[signing.release]
store_file = "release.jks"
store_password = "pw"
key_alias = "upload"

[variants.release]
signing = "release"
"#,
        );
        let resolver = VariantResolver::new(&descriptor);
        for name in ["debug", "release"] {
            let first = resolver.resolve(name).unwrap();
            let second = resolver.resolve(name).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_unknown_variant() {
        let descriptor = load("");
        for name in ["staging", "Release", "", "profile"] {
            match descriptor.resolve(name) {
                Err(DescriptorError::UnknownVariant { name: n, declared }) => {
                    assert_eq!(n, name);
                    assert_eq!(declared, "debug, release");
                }
                other => panic!("expected UnknownVariant for {:?}, got {:?}", name, other),
            }
        }
    }

    #[test]
    fn test_release_without_signing_is_unbound() {
        let descriptor = load(
            r#"
[variants.release]
minify = true
"#,
        );
        assert!(matches!(
            descriptor.resolve("release"),
            Err(DescriptorError::UnboundSigningProfile(name)) if name == "release"
        ));
    }

    #[test]
    fn test_debug_binds_implicit_profile() {
        let descriptor = load("");
        let debug = descriptor.resolve("debug").unwrap();
        assert!(debug.debuggable);
        assert_eq!(debug.signing.name, "debug");
        assert_eq!(debug.signing.key_alias, "androiddebugkey");
    }

    #[test]
    fn test_release_fully_bound() {
        let descriptor = load(
            r#"
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
"#,
        );
        let release = descriptor.resolve("release").unwrap();
        assert!(!release.debuggable);
        assert!(!release.minify);
        assert_eq!(release.signing.name, "release");
        assert_eq!(
            release.rule_files,
            vec![
                RuleFile::SdkDefault("proguard-android-optimize.txt".into()),
                RuleFile::Project("./proguard-rules.pro".into()),
            ]
        );
    }

    #[test]
    fn test_custom_variant() {
        let descriptor = load(
            r#"
[variants.staging]
signing = "debug"
application_id_suffix = ".staging"
"#,
        );
        let resolver = VariantResolver::new(&descriptor);
        assert_eq!(resolver.variant_names(), vec!["debug", "release", "staging"]);

        let staging = resolver.resolve("staging").unwrap();
        assert_eq!(staging.application_id_suffix.as_deref(), Some(".staging"));
        assert_eq!(staging.signing.name, "debug");
    }
}
