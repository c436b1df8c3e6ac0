//! Error types for the audit chain.
//!
//! Every fallible operation returns `AuditResult<T>`. Tampering found during
//! verification is reported in an `IntegrityReport`, never as an error.

use thiserror::Error;

/// The unified error type for the audit chain crates.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The persistence collaborator could not serve the request.
    ///
    /// Appends are never retried automatically on this error.
    #[error("audit store unavailable: {reason}")]
    StoreUnavailable { reason: String },

    /// The chain tail moved between reading the predecessor and writing the
    /// new entry. The whole append should be retried.
    #[error("chain race detected: expected tail {expected}, found {found}")]
    ChainRaceDetected { expected: String, found: String },

    /// A search or export filter is inconsistent (e.g. start after end).
    #[error("invalid filter: {reason}")]
    InvalidFilter { reason: String },

    /// Retention cleanup was asked to run with a non-positive period.
    #[error("invalid retention period: {days} days")]
    InvalidRetentionPeriod { days: i64 },

    /// An export could not be rendered or handed to the artifact sink.
    #[error("export failed: {reason}")]
    ExportFailed { reason: String },

    /// An export artifact is unknown or past its expiry.
    #[error("export artifact '{reference}' is unavailable")]
    ArtifactUnavailable { reference: String },

    /// An entry or payload could not be serialized.
    #[error("serialization error: {reason}")]
    Serialization { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },
}

impl From<serde_json::Error> for AuditError {
    fn from(e: serde_json::Error) -> Self {
        AuditError::Serialization {
            reason: e.to_string(),
        }
    }
}

/// Convenience alias used throughout the audit chain crates.
pub type AuditResult<T> = Result<T, AuditError>;
