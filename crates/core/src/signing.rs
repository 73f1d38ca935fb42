//! Signing Profiles
//!
//! Keystore credentials used to sign an artifact, plus the built-in
//! debug profile every Android project gets for free.

use std::fmt;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::{DescriptorError, Result};

/// Name of the implicit debug signing profile
pub const DEBUG_PROFILE: &str = "debug";

const ENV_PREFIX: &str = "env:";

/// A secret as written in the descriptor: either inline, or a pointer
/// to an environment variable (`env:NAME`).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CredentialRef {
    Literal(String),
    Env(String),
}

impl CredentialRef {
    /// Get the secret value, reading the environment if needed
    pub fn reveal(&self) -> Result<String> {
        match self {
            CredentialRef::Literal(value) => Ok(value.clone()),
            CredentialRef::Env(name) => {
                std::env::var(name).map_err(|_| DescriptorError::Credential(name.clone()))
            }
        }
    }
}

impl From<String> for CredentialRef {
    fn from(value: String) -> Self {
        match value.strip_prefix(ENV_PREFIX) {
            Some(name) => CredentialRef::Env(name.to_string()),
            None => CredentialRef::Literal(value),
        }
    }
}

impl From<&str> for CredentialRef {
    fn from(value: &str) -> Self {
        CredentialRef::from(value.to_string())
    }
}

impl From<CredentialRef> for String {
    fn from(value: CredentialRef) -> Self {
        match value {
            CredentialRef::Literal(value) => value,
            CredentialRef::Env(name) => format!("{}{}", ENV_PREFIX, name),
        }
    }
}

// Literal secrets never show up in logs or `{:?}` output.
impl fmt::Debug for CredentialRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialRef::Literal(_) => f.write_str("Literal(***)"),
            CredentialRef::Env(name) => f.debug_tuple("Env").field(name).finish(),
        }
    }
}

impl fmt::Display for CredentialRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialRef::Literal(_) => f.write_str("***"),
            CredentialRef::Env(name) => write!(f, "{}{}", ENV_PREFIX, name),
        }
    }
}

/// Signing profile (a named keystore credential set)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SigningProfile {
    /// Profile name (e.g. "debug", "release")
    pub name: String,
    /// Path to keystore file
    pub store_file: PathBuf,
    /// Keystore password
    #[serde(serialize_with = "redacted")]
    pub store_password: CredentialRef,
    /// Key alias
    pub key_alias: String,
    /// Key password (if different from keystore password)
    #[serde(serialize_with = "redacted_opt")]
    pub key_password: Option<CredentialRef>,
}

impl SigningProfile {
    /// Create a new signing profile
    pub fn new(name: &str, store_file: PathBuf, store_password: CredentialRef, key_alias: &str) -> Self {
        Self {
            name: name.to_string(),
            store_file,
            store_password,
            key_alias: key_alias.to_string(),
            key_password: None,
        }
    }

    /// Set a key password distinct from the store password
    pub fn with_key_password(mut self, key_password: CredentialRef) -> Self {
        self.key_password = Some(key_password);
        self
    }

    /// The default debug profile Android tooling creates under `~/.android`
    pub fn debug() -> Self {
        Self::new(
            DEBUG_PROFILE,
            debug_keystore_path(),
            CredentialRef::from("android"),
            "androiddebugkey",
        )
        .with_key_password(CredentialRef::from("android"))
    }

    /// Get the effective key password
    pub fn effective_key_password(&self) -> &CredentialRef {
        self.key_password.as_ref().unwrap_or(&self.store_password)
    }

    /// Check if keystore exists
    pub fn keystore_exists(&self) -> bool {
        self.store_file.exists()
    }

    /// Anchor a relative keystore path at `base`
    pub(crate) fn rebase(mut self, base: &Path) -> Self {
        if self.store_file.is_relative() {
            self.store_file = base.join(&self.store_file);
        }
        self
    }
}

fn redacted<S: serde::Serializer>(value: &CredentialRef, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

fn redacted_opt<S: serde::Serializer>(
    value: &Option<CredentialRef>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match value {
        Some(value) => serializer.collect_str(value),
        None => serializer.serialize_none(),
    }
}

/// Location of the shared debug keystore
pub fn debug_keystore_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".android")
        .join("debug.keystore")
}
