//!
//! userstore: a ready-made "users collection" on top of a document store.
//!
//! The library validates field constraints, hashes designated sensitive fields and
//! transparently verifies those hashed fields before any record is disclosed or mutated.
//!
//! ## Core Concepts
//!
//! * **Documents (`document::Document`)**: A user record or a filter, mapping field names to JSON values.
//! * **Schema (`schema::Schema`)**: Per-field `required` / `unique` / `hashable` flags, read once when the store opens.
//! * **Hash Providers (`hash::HashProvider`)**: A pluggable salted one-way function pair. PBKDF2 by default, Argon2id available.
//! * **Backends (`backend::Backend`)**: The document store the users live in. `InMemory` and (with the `sqlite` feature) `SqliteBackend` are provided.
//! * **UserStore (`store::UserStore`)**: The operation surface. Every read or mutation addressed with a plaintext
//!   value for a hashed field is reconciled against the stored hash first; a wrong value behaves exactly like a
//!   record that does not exist.

pub mod backend;
pub mod constants;
pub mod document;
pub mod hash;
pub mod schema;
pub mod store;

pub use document::{Document, Value};
pub use schema::{FieldDescriptor, Schema};
pub use store::{MembershipOp, StoreOptions, UserStore};

/// Result type used throughout the userstore library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the userstore library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A required or unique rule rejected the write
    #[error(transparent)]
    Constraint(store::ConstraintError),

    /// Invalid store construction
    #[error(transparent)]
    Store(store::StoreError),

    /// Failures reported by the document store
    #[error(transparent)]
    Backend(backend::BackendError),

    /// Failures reported by the hash provider
    #[error(transparent)]
    Hash(hash::HashError),

    /// Malformed documents handed to the library
    #[error(transparent)]
    Document(document::DocumentError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Constraint(_) | Error::Store(_) => "store",
            Error::Backend(_) => "backend",
            Error::Hash(_) => "hash",
            Error::Document(_) => "document",
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Check if this error is a constraint violation (`NotNull` or `Unique`).
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Error::Constraint(_))
    }

    /// Check if a required field was missing or cleared.
    pub fn is_not_null_violation(&self) -> bool {
        match self {
            Error::Constraint(err) => err.is_not_null(),
            _ => false,
        }
    }

    /// Check if the store rejected the write because of a unique index.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Error::Constraint(err) => err.is_unique(),
            _ => false,
        }
    }

    /// Check if this error is an operational failure of the store or the hash provider.
    ///
    /// Operational failures mean the outcome could not be determined, as opposed to
    /// a constraint violation or a plain "no match".
    pub fn is_operational(&self) -> bool {
        matches!(self, Error::Backend(_) | Error::Hash(_) | Error::Io(_))
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        match self {
            Error::Io(_) => true,
            Error::Backend(backend_err) => backend_err.is_io_error(),
            _ => false,
        }
    }
}
