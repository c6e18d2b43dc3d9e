//! Error types for store operations.
//!
//! Constraint violations are the only errors a caller is expected to act on
//! (e.g. "email already taken"). Everything operational comes from the backend or the
//! hash provider and keeps its own type.

use thiserror::Error;

use crate::backend::BackendError;

/// A write rejected by a required or unique rule.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConstraintError {
    /// Required fields missing from an insert, or cleared by an update.
    #[error("NotNull constraint not respected: {}", fields.join(", "))]
    NotNull { fields: Vec<String> },

    /// The store reported a unique index violation.
    #[error("Unique constraint not respected: {source}")]
    Unique {
        #[source]
        source: BackendError,
    },
}

impl ConstraintError {
    pub fn is_not_null(&self) -> bool {
        matches!(self, ConstraintError::NotNull { .. })
    }

    pub fn is_unique(&self) -> bool {
        matches!(self, ConstraintError::Unique { .. })
    }

    /// Fields named by a `NotNull` violation.
    pub fn fields(&self) -> &[String] {
        match self {
            ConstraintError::NotNull { fields } => fields,
            ConstraintError::Unique { .. } => &[],
        }
    }
}

/// Errors raised while opening a store.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
    /// An option value the store cannot work with.
    #[error("Invalid option '{name}': {reason}")]
    InvalidOption { name: String, reason: String },
}

impl From<ConstraintError> for crate::Error {
    fn from(err: ConstraintError) -> Self {
        crate::Error::Constraint(err)
    }
}

impl From<StoreError> for crate::Error {
    fn from(err: StoreError) -> Self {
        crate::Error::Store(err)
    }
}
