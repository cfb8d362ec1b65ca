//! Domain error types
//!
//! This module defines the error hierarchy for Meridian. All errors are
//! domain-specific and don't expose third-party types (the HTTP client and
//! database driver errors are converted at the adapter boundary).

use thiserror::Error;

/// Main Meridian error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum MeridianError {
    /// Configuration-related errors (malformed integrator URL, invalid TOML, …)
    ///
    /// Never retried; surfaced immediately to the caller.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Errors from the remote integrator services
    #[error("Integrator error: {0}")]
    Remote(#[from] RemoteError),

    /// Errors from the local fallback storage backend
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Errors in transfer file framing
    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),

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

impl MeridianError {
    /// True when the underlying cause is a connectivity failure
    /// (connection refused or timeout), as opposed to a remote business
    /// error or a local fault.
    ///
    /// Callers use this to decide whether to latch the offline flag and
    /// fall back to local storage.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, MeridianError::Remote(e) if e.is_connectivity())
    }
}

/// Integrator service errors
///
/// Errors that occur when calling the remote integrator web services.
/// These don't expose the HTTP client's types.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Failed to reach the integrator endpoint (connection refused)
    #[error("Failed to connect to integrator: {0}")]
    ConnectionRefused(String),

    /// Connect or read timeout elapsed
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Facility credentials were rejected
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Remote call completed but the server reported a fault (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Remote call completed but the request was rejected (4xx)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// Response body could not be parsed
    #[error("Invalid response from integrator: {0}")]
    InvalidResponse(String),

    /// A write was rejected because the health identification number
    /// already exists on the remote side
    #[error("Duplicate health identification number: {0}")]
    DuplicateIdentifier(String),

    /// A write was rejected because the health identification number
    /// is not valid
    #[error("Invalid health identification number: {0}")]
    InvalidIdentifier(String),
}

impl RemoteError {
    /// True for network-level failures that indicate the integrator is
    /// unreachable. Remote business errors (duplicate identifiers, 4xx)
    /// are not connectivity failures and must not mark the integrator
    /// offline.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            RemoteError::ConnectionRefused(_) | RemoteError::Timeout(_)
        )
    }
}

/// Failure to construct a client for a non-critical, directory-style
/// service (e.g. the provider directory).
///
/// This is a distinct type, not a `MeridianError` variant, so that call
/// sites degrade gracefully as a conscious decision rather than via a
/// silent null check.
#[derive(Debug, Error)]
#[error("Optional service '{service}' unavailable: {reason}")]
pub struct OptionalServiceError {
    /// Service name (e.g. "ProviderService")
    pub service: &'static str,

    /// Human-readable reason the client could not be built
    pub reason: String,
}

/// Fallback storage errors
///
/// Errors that occur when reading or writing the local fallback store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Failed to connect to the storage backend
    #[error("Failed to connect to fallback storage: {0}")]
    ConnectionFailed(String),

    /// Query failed
    #[error("Fallback query failed: {0}")]
    QueryFailed(String),

    /// Write failed
    #[error("Fallback write failed: {0}")]
    WriteFailed(String),

    /// Stored payload could not be deserialized
    ///
    /// On the read path this is caught and logged, never propagated:
    /// the fallback path must not crash a caller already handling a
    /// primary-path failure.
    #[error("Failed to deserialize fallback payload: {0}")]
    DeserializationFailed(String),
}

/// Transfer framing errors
#[derive(Debug, Error)]
pub enum TransferError {
    /// The header declares a format version this build does not support
    #[error("Unsupported transfer format version: {0}")]
    UnsupportedVersion(u32),

    /// The incremental transfer's dependency checksum does not match the
    /// receiver's last-applied checksum. The transfer must be rejected
    /// and a full resync requested.
    #[error("Transfer out of sequence: expected dependency {expected:?}, found {found:?}")]
    OutOfSequence {
        expected: Option<String>,
        found: Option<String>,
    },

    /// The footer checksum does not match the payload
    #[error("Transfer checksum mismatch: expected {expected}, computed {computed}")]
    ChecksumMismatch { expected: String, computed: String },

    /// The stream ended before a footer frame was read
    #[error("Transfer stream truncated before footer")]
    Truncated,

    /// A frame could not be parsed
    #[error("Malformed transfer frame: {0}")]
    MalformedFrame(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for MeridianError {
    fn from(err: std::io::Error) -> Self {
        MeridianError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for MeridianError {
    fn from(err: serde_json::Error) -> Self {
        MeridianError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for MeridianError {
    fn from(err: toml::de::Error) -> Self {
        MeridianError::Configuration(format!("TOML parse error: {err}"))
    }
}
