//! Error types for bigip-ctlr
//!
//! The synthesis pipeline itself never fails; these errors cover everything
//! around it: loading snapshots and configuration, parsing override payloads
//! and rendering the final declaration.

use thiserror::Error;

/// Default context value when no specific context is available
pub const UNKNOWN_CONTEXT: &str = "unknown";

/// Main error type for bigip-ctlr operations
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or missing controller configuration
    #[error("configuration error: {message}")]
    Config {
        /// Description of what's invalid
        message: String,
        /// The offending field (e.g., "userAgent")
        field: Option<String>,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
        /// The document kind being (de)serialized, if known
        kind: Option<String>,
    },

    /// Input that parsed but is semantically unusable
    #[error("validation error for {resource}: {message}")]
    Validation {
        /// Name of the resource with the invalid content
        resource: String,
        /// Description of what's invalid
        message: String,
    },

    /// Filesystem error while reading inputs
    #[error("io error reading {path}: {source}")]
    Io {
        /// Path that could not be read
        path: String,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Internal/operational error
    #[error("internal error [{context}]: {message}")]
    Internal {
        /// Description of what failed
        message: String,
        /// Context where the error occurred (e.g., "render", "cli")
        context: String,
    },
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
            field: None,
        }
    }

    /// Create a configuration error pointing at a specific field
    pub fn config_field(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: None,
        }
    }

    /// Create a serialization error with document kind context
    pub fn serialization_for_kind(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: Some(kind.into()),
        }
    }

    /// Create a validation error without a resource name
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            resource: UNKNOWN_CONTEXT.to_string(),
            message: msg.into(),
        }
    }

    /// Create a validation error for a named resource
    pub fn validation_for(resource: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Validation {
            resource: resource.into(),
            message: msg.into(),
        }
    }

    /// Create an IO error for the given path
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an internal error with context
    pub fn internal_with_context(context: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            context: context.into(),
        }
    }

    /// Get the field if this is a configuration error about a specific field
    pub fn field(&self) -> Option<&str> {
        match self {
            Error::Config { field, .. } => field.as_deref(),
            _ => None,
        }
    }

    /// Get the document kind if this is a serialization error
    pub fn kind(&self) -> Option<&str> {
        match self {
            Error::Serialization { kind, .. } => kind.as_deref(),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::serialization(err.to_string())
    }
}

impl From<crate::yaml::YamlError> for Error {
    fn from(err: crate::yaml::YamlError) -> Self {
        Error::serialization_for_kind("yaml", err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_name_the_field() {
        let err = Error::config_field("userAgent", "must not be empty");
        assert!(err.to_string().contains("configuration error"));
        assert_eq!(err.field(), Some("userAgent"));

        let err = Error::config("no partition");
        assert_eq!(err.field(), None);
    }

    #[test]
    fn serialization_errors_carry_kind() {
        let err = Error::serialization_for_kind("override", "expected object");
        assert_eq!(err.kind(), Some("override"));
        assert!(err.to_string().contains("expected object"));
    }

    #[test]
    fn validation_defaults_to_unknown_resource() {
        let err = Error::validation("bad reference");
        assert!(err.to_string().contains(UNKNOWN_CONTEXT));

        let err = Error::validation_for("tls-edge", "bad reference");
        assert!(err.to_string().contains("tls-edge"));
    }

    #[test]
    fn json_errors_convert_to_serialization() {
        let json_err =
            serde_json::from_str::<serde_json::Value>("{").expect_err("truncated json should fail");
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization { .. }));
    }

    #[test]
    fn io_errors_include_path() {
        let err = Error::io(
            "/tmp/snapshot.yaml",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(err.to_string().contains("/tmp/snapshot.yaml"));
    }
}
