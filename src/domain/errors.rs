//! Domain error types
//!
//! This module defines the error hierarchy for Cloak. All errors are
//! domain-specific and don't expose third-party types.
//!
//! The variants fall into three severity classes that the pipeline relies on:
//!
//! - **Fatal** ([`CloakError::MalformedKey`], [`CloakError::InvariantViolation`],
//!   [`CloakError::Configuration`]): the run aborts immediately. Malformed input
//!   means the extract was not pre-validated; an invariant violation means two
//!   pipeline stages fell out of lock-step.
//! - **Reportable** ([`CloakError::MissingState`]): returned to the caller,
//!   which decides whether to skip the entity or abort.
//! - **Ambient** (I/O, CSV, crypto, tagging, serialization): wrapped external
//!   failures.

use thiserror::Error;

/// Main Cloak error type
///
/// This is the primary error type used throughout the application.
#[derive(Debug, Error)]
pub enum CloakError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A primary key column that must be numeric failed to parse.
    ///
    /// The extract is assumed pre-validated upstream; hitting this means the
    /// pipeline is misconfigured, so the run aborts.
    #[error("Malformed numeric key in {table}: {value:?}")]
    MalformedKey { table: &'static str, value: String },

    /// Derived state expected from an earlier stage was not found.
    ///
    /// Reportable: the caller decides whether to skip the entity or abort.
    #[error("Missing derived state: {0}")]
    MissingState(String),

    /// Two components that must stay in lock-step disagree.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Errors from the encryption collaborator
    #[error("Encryption error: {0}")]
    Crypto(String),

    /// Errors from the deterministic tagging collaborator
    #[error("Tagging error: {0}")]
    Tagging(String),

    /// CSV parse/write errors
    #[error("CSV error: {0}")]
    Csv(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl CloakError {
    /// Whether the error may be tolerated by a caller that chooses to skip
    /// the offending entity instead of aborting the run.
    pub fn is_reportable(&self) -> bool {
        matches!(self, CloakError::MissingState(_))
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for CloakError {
    fn from(err: std::io::Error) -> Self {
        CloakError::Io(err.to_string())
    }
}

// Conversion from csv::Error
impl From<csv::Error> for CloakError {
    fn from(err: csv::Error) -> Self {
        CloakError::Csv(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for CloakError {
    fn from(err: serde_json::Error) -> Self {
        CloakError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for CloakError {
    fn from(err: toml::de::Error) -> Self {
        CloakError::Configuration(format!("TOML parse error: {err}"))
    }
}
