//! PBKDF2-HMAC-SHA256 hash records.
//!
//! A record is `salt || base64(key)`:
//! - the salt is the first [`SALT_LENGTH`] characters of 32 random bytes in base64;
//! - the key is PBKDF2-HMAC-SHA256 of the plaintext and the salt *text*.

use async_trait::async_trait;
use base64ct::{Base64, Encoding};
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::{HashError, HashProvider, run_blocking};
use crate::Result;
use crate::constants::{DEFAULT_ITERATIONS, DEFAULT_KEY_LENGTH};

/// Length, in characters, of the salt prefix of a record.
pub const SALT_LENGTH: usize = 35;

/// Random bytes drawn for each salt.
const SALT_BYTES: usize = 32;

/// Generates a fresh salt string.
pub fn generate_salt() -> String {
    let mut bytes = [0u8; SALT_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    let mut salt = Base64::encode_string(&bytes);
    salt.truncate(SALT_LENGTH);
    salt
}

/// Builds the record for `plaintext` under `salt`.
pub fn derive_record(plaintext: &str, salt: &str, iterations: u32, key_length: usize) -> String {
    let mut key = vec![0u8; key_length];
    pbkdf2::pbkdf2_hmac::<Sha256>(plaintext.as_bytes(), salt.as_bytes(), iterations, &mut key);
    format!("{salt}{}", Base64::encode_string(&key))
}

/// The default hash provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pbkdf2Hasher {
    key_length: usize,
    iterations: u32,
}

impl Pbkdf2Hasher {
    pub fn new(key_length: usize, iterations: u32) -> Self {
        Self {
            key_length,
            iterations,
        }
    }

    pub fn key_length(&self) -> usize {
        self.key_length
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    async fn derive(&self, plaintext: &str, salt: String) -> Result<String> {
        let plaintext = plaintext.to_owned();
        let (iterations, key_length) = (self.iterations, self.key_length);
        run_blocking(move || Ok(derive_record(&plaintext, &salt, iterations, key_length))).await
    }
}

impl Default for Pbkdf2Hasher {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_LENGTH, DEFAULT_ITERATIONS)
    }
}

#[async_trait]
impl HashProvider for Pbkdf2Hasher {
    async fn hash(&self, plaintext: &str) -> Result<String> {
        self.derive(plaintext, generate_salt()).await
    }

    async fn verify(&self, plaintext: &str, record: &str) -> Result<bool> {
        let Some(salt) = record.get(..SALT_LENGTH) else {
            return Err(HashError::MalformedRecord {
                reason: format!("record shorter than the {SALT_LENGTH}-character salt"),
            }
            .into());
        };

        let expected = self.derive(plaintext, salt.to_string()).await?;
        Ok(expected.as_bytes().ct_eq(record.as_bytes()).into())
    }
}
