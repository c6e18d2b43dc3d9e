//! Error types for hash providers.

use thiserror::Error;

/// Errors raised while hashing or verifying a field.
///
/// A plaintext that simply does not match its record is not an error: providers
/// return `Ok(false)` for that.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum HashError {
    /// The stored value cannot be a record produced by this provider.
    #[error("Malformed hash record: {reason}")]
    MalformedRecord { reason: String },

    /// A hashable field was submitted with a non-string value.
    #[error("Field {field:?} is hashable and must be a string")]
    UnsupportedValue { field: String },

    /// The underlying primitive failed.
    #[error("Hashing failed: {reason}")]
    Failed { reason: String },

    /// The blocking task running the derivation did not complete.
    #[error("Hash task failed: {reason}")]
    Task { reason: String },

    /// Failure reported by a caller-supplied provider.
    #[error("Hash provider failed: {source}")]
    Custom {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl HashError {
    /// Wraps an error from a custom provider.
    pub fn custom(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        HashError::Custom {
            source: source.into(),
        }
    }

    /// Check if the stored record could not be parsed.
    pub fn is_malformed_record(&self) -> bool {
        matches!(self, HashError::MalformedRecord { .. })
    }
}

impl From<HashError> for crate::Error {
    fn from(err: HashError) -> Self {
        crate::Error::Hash(err)
    }
}
