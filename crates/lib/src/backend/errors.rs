//! Error types for the userstore backends.
//!
//! This module defines structured error types for document store operations.
//! Everything here is an operational failure from the point of view of the store
//! facade, except duplicate-key errors, which the facade re-tags as unique
//! constraint violations while keeping the original error as the source.

use thiserror::Error;

use crate::constants::DUPLICATE_KEY_CODE;

/// Errors that can occur during backend operations.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BackendError {
    /// A write would have produced two documents with the same unique index key.
    #[error("E{code} duplicate key error index: {index}")]
    DuplicateKey {
        /// Name of the violated index
        index: String,
        /// Store-native error code
        code: i32,
    },

    /// The store could not be reached.
    #[error("Store unavailable: {reason}")]
    Unavailable {
        /// Description of the connectivity failure
        reason: String,
    },

    /// The store did not answer in time.
    #[error("Store operation timed out: {operation}")]
    Timeout {
        /// The operation that timed out
        operation: String,
    },

    /// An update operator cannot be applied to the stored document.
    #[error("Invalid update: {reason}")]
    InvalidUpdate {
        /// Why the update was rejected
        reason: String,
    },

    /// A field name the backend cannot address.
    #[error("Invalid field name: {field:?}")]
    InvalidFieldName {
        /// The offending field name
        field: String,
    },

    /// Serialization failed.
    #[error("Serialization failed")]
    SerializationFailed {
        /// The underlying serialization error
        #[source]
        source: serde_json::Error,
    },

    /// Deserialization failed.
    #[error("Deserialization failed")]
    DeserializationFailed {
        /// The underlying deserialization error
        #[source]
        source: serde_json::Error,
    },

    /// File I/O error.
    #[error("File I/O error")]
    FileIo {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// SQL backend error.
    #[cfg(feature = "sqlite")]
    #[error("SQL error: {reason}")]
    SqlxError {
        /// Description of the SQL operation that failed
        reason: String,
        /// The underlying sqlx error
        #[source]
        source: Option<sqlx::Error>,
    },
}

impl BackendError {
    /// Check if the store rejected a write because of a unique index.
    ///
    /// Matches the in-memory duplicate-key error as well as the native unique-violation
    /// error code reported by SQL stores.
    pub fn is_duplicate_key(&self) -> bool {
        match self {
            BackendError::DuplicateKey { code, .. } => *code == DUPLICATE_KEY_CODE,
            #[cfg(feature = "sqlite")]
            BackendError::SqlxError {
                source: Some(source),
                ..
            } => source
                .as_database_error()
                .is_some_and(|db_err| db_err.is_unique_violation()),
            _ => false,
        }
    }

    /// Check if the store could not be reached or did not answer in time.
    pub fn is_unavailable(&self) -> bool {
        match self {
            BackendError::Unavailable { .. } | BackendError::Timeout { .. } => true,
            #[cfg(feature = "sqlite")]
            BackendError::SqlxError {
                source: Some(source),
                ..
            } => matches!(
                source,
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
            ),
            _ => false,
        }
    }

    /// Check if this error is related to I/O operations.
    pub fn is_io_error(&self) -> bool {
        matches!(
            self,
            BackendError::FileIo { .. }
                | BackendError::SerializationFailed { .. }
                | BackendError::DeserializationFailed { .. }
        )
    }
}

// Conversion from BackendError to the main Error type
impl From<BackendError> for crate::Error {
    fn from(err: BackendError) -> Self {
        crate::Error::Backend(err)
    }
}
