//! Error types for droidpack
//!
//! Centralized error handling using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading a descriptor or resolving one of its variants
#[derive(Error, Debug)]
pub enum DescriptorError {
    #[error("missing required field `{0}`")]
    MissingField(String),

    #[error("invalid value for `{field}`: {reason}")]
    InvalidField {
        field: String,
        reason: String,
    },

    #[error("unknown build variant `{name}` (declared: {declared})")]
    UnknownVariant {
        name: String,
        declared: String,
    },

    #[error("build variant `{0}` has no signing profile bound")]
    UnboundSigningProfile(String),

    #[error("build variant `{variant}` references undeclared signing profile `{profile}`")]
    UnknownSigningProfile {
        variant: String,
        profile: String,
    },

    #[error("application identifier changed from `{previous}` to `{current}`")]
    IdentifierChanged {
        previous: String,
        current: String,
    },

    #[error("version code must increase: previous {previous}, current {current}")]
    VersionCodeNotIncreasing {
        previous: u32,
        current: u32,
    },

    #[error("credential `{0}` is not set in the environment")]
    Credential(String),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for descriptor operations
pub type Result<T> = std::result::Result<T, DescriptorError>;

impl DescriptorError {
    pub(crate) fn missing(field: impl Into<String>) -> Self {
        DescriptorError::MissingField(field.into())
    }

    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        DescriptorError::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Name of the descriptor field this error points at, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            DescriptorError::MissingField(field) => Some(field.as_str()),
            DescriptorError::InvalidField { field, .. } => Some(field.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_names_field() {
        let err = DescriptorError::MissingField("sdk.min".into());
        assert_eq!(err.field(), Some("sdk.min"));
        assert_eq!(err.to_string(), "missing required field `sdk.min`");
    }

    #[test]
    fn test_invalid_field_names_field() {
        let err = DescriptorError::invalid("app.namespace", "not a reverse-domain identifier");
        assert_eq!(err.field(), Some("app.namespace"));
        assert!(DescriptorError::UnboundSigningProfile("release".into()).field().is_none());
    }
}
