//! Error types for Fieldmark.
//!
//! A single taxonomy is shared by the schema compiler, the document codec,
//! and the search orchestrator:
//!
//! - schema and property errors are programming errors in a record type and
//!   are never retried
//! - validation errors carry the field → message violations
//! - not-found conditions are resolved by the caller's policy
//! - backend errors propagate unchanged; this layer performs no retries

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single failed constraint on a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Field path the constraint is attached to.
    pub field: String,
    /// Human-readable reason.
    pub message: String,
}

impl Violation {
    /// Create a violation for a field.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Errors that can occur in Fieldmark.
///
/// Marked `#[non_exhaustive]` so new variants can be added without breaking
/// downstream matches.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The compiled schema breaks an invariant (duplicate field, too many
    /// sortable fields, several default sorting fields, no queryable field).
    #[error("Invalid schema: {message}")]
    InvalidSchema {
        /// What is wrong with the schema
        message: String,
    },

    /// A record type is declared incorrectly.
    #[error("Invalid property: {message}")]
    InvalidProperty {
        /// What is wrong with the declaration
        message: String,
    },

    /// A record failed its declared constraints.
    #[error("Validation failed for {record}: {}", format_violations(.violations))]
    ValidationFailed {
        /// Record type that was validated
        record: String,
        /// Every failed constraint
        violations: Vec<Violation>,
    },

    /// A document or collection does not exist in the backend.
    #[error("Not found: {message}")]
    NotFound {
        /// What could not be found
        message: String,
    },

    /// The backend already holds a collection with this name.
    #[error("Collection already exists: {collection}")]
    AlreadyExists {
        /// Collection name
        collection: String,
    },

    /// A record type was used without being registered.
    #[error("Record type is not registered: {type_name}")]
    UnregisteredType {
        /// Rust type name of the record
        type_name: String,
    },

    /// A raw document could not be turned into a record.
    #[error("Failed to decode {type_name}: {message}")]
    Codec {
        /// Record type being decoded
        type_name: String,
        /// Underlying reason
        message: String,
    },

    /// The search backend or its transport failed.
    #[error("Backend error{}: {message}", format_status(.status))]
    Backend {
        /// HTTP status, when the failure came with one
        status: Option<u16>,
        /// Human-readable error message
        message: String,
        /// Source error if available
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience `Result` type alias for Fieldmark operations.
pub type Result<T> = std::result::Result<T, Error>;

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn format_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl Error {
    /// Returns whether this error is retryable.
    ///
    /// Only transport-level failures qualify. Fieldmark never retries on its
    /// own; callers decide.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Backend { status, .. } => match status {
                Some(code) => *code == 429 || *code >= 500,
                None => true,
            },
            Error::Io(_) => true,
            Error::InvalidSchema { .. }
            | Error::InvalidProperty { .. }
            | Error::ValidationFailed { .. }
            | Error::NotFound { .. }
            | Error::AlreadyExists { .. }
            | Error::UnregisteredType { .. }
            | Error::Codec { .. }
            | Error::Config { .. }
            | Error::Serialization(_) => false,
        }
    }

    /// Returns `true` for the not-found condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Creates a new invalid-schema error.
    pub fn invalid_schema<S: Into<String>>(message: S) -> Self {
        Error::InvalidSchema {
            message: message.into(),
        }
    }

    /// Creates a new invalid-property error.
    pub fn invalid_property<S: Into<String>>(message: S) -> Self {
        Error::InvalidProperty {
            message: message.into(),
        }
    }

    /// Creates a new validation error.
    pub fn validation_failed<S: Into<String>>(record: S, violations: Vec<Violation>) -> Self {
        Error::ValidationFailed {
            record: record.into(),
            violations,
        }
    }

    /// Creates a new not-found error.
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Error::NotFound {
            message: message.into(),
        }
    }

    /// Creates a new codec error.
    pub fn codec<T, M>(type_name: T, message: M) -> Self
    where
        T: Into<String>,
        M: Into<String>,
    {
        Error::Codec {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// Creates a new backend error without a status.
    pub fn backend<S: Into<String>>(message: S) -> Self {
        Error::Backend {
            status: None,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new backend error carrying an HTTP status.
    pub fn backend_status<S: Into<String>>(status: u16, message: S) -> Self {
        Error::Backend {
            status: Some(status),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new backend error with a message and source error.
    pub fn backend_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Backend {
            status: None,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }
}
