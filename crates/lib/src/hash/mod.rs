//! Hash providers for hashable fields.
//!
//! A [`HashProvider`] is a salted one-way function pair: `hash` turns a plaintext
//! into a self-contained record, `verify` checks a plaintext against such a record.
//! Stores never compare records directly, so any scheme embedding its own salt works.
//!
//! Two providers ship with the crate:
//!
//! * [`Pbkdf2Hasher`], the default: PBKDF2-HMAC-SHA256 with a 35-character salt prefix.
//! * [`Argon2Hasher`]: Argon2id PHC strings.

mod argon2id;
mod errors;
mod pbkdf2_sha256;

use async_trait::async_trait;

pub use argon2id::Argon2Hasher;
pub use errors::HashError;
pub use pbkdf2_sha256::{Pbkdf2Hasher, SALT_LENGTH, derive_record, generate_salt};

use crate::Result;

/// A salted one-way function used for hashable fields.
///
/// Implementations must be safe to share across concurrent operations.
#[async_trait]
pub trait HashProvider: Send + Sync + std::fmt::Debug {
    /// Hashes `plaintext` with a fresh salt, returning the record to store.
    async fn hash(&self, plaintext: &str) -> Result<String>;

    /// Returns true iff `record` was produced by hashing `plaintext`.
    ///
    /// A mismatch is `Ok(false)`. Errors are reserved for records that cannot be
    /// interpreted and for internal failures.
    async fn verify(&self, plaintext: &str, record: &str) -> Result<bool>;
}

/// Runs a CPU-heavy derivation on the blocking pool and waits for it.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| HashError::Task {
            reason: e.to_string(),
        })?
}
