//! Argon2id hash records in PHC string format.

use argon2::{
    Argon2,
    password_hash::{
        Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        rand_core,
    },
};
use async_trait::async_trait;

use super::{HashError, HashProvider, run_blocking};
use crate::Result;

/// Hash provider producing Argon2id PHC strings (`$argon2id$v=19$...`).
///
/// Uses the `argon2` crate defaults. Records carry their own parameters, so
/// records written with other parameters still verify.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Hasher;

impl Argon2Hasher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl HashProvider for Argon2Hasher {
    async fn hash(&self, plaintext: &str) -> Result<String> {
        let plaintext = plaintext.to_owned();
        run_blocking(move || {
            let salt = SaltString::generate(&mut rand_core::OsRng);
            let hash = Argon2::default()
                .hash_password(plaintext.as_bytes(), &salt)
                .map_err(|e| HashError::Failed {
                    reason: format!("Password hashing failed: {e}"),
                })?;
            Ok(hash.to_string())
        })
        .await
    }

    async fn verify(&self, plaintext: &str, record: &str) -> Result<bool> {
        let plaintext = plaintext.to_owned();
        let record = record.to_owned();
        run_blocking(move || {
            let parsed = PasswordHash::new(&record).map_err(|e| HashError::MalformedRecord {
                reason: e.to_string(),
            })?;
            match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
                Ok(()) => Ok(true),
                Err(PasswordHashError::Password) => Ok(false),
                Err(e) => Err(HashError::Failed {
                    reason: format!("Password verification failed: {e}"),
                }
                .into()),
            }
        })
        .await
    }
}
