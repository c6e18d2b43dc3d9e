//! Options recognised when opening a store.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::StoreError;
use crate::Result;
use crate::backend::IndexSpec;
use crate::constants::{DEFAULT_COLLECTION, DEFAULT_ITERATIONS, DEFAULT_KEY_LENGTH};
use crate::hash::{HashProvider, Pbkdf2Hasher};

/// Configuration for [`UserStore::open`](super::UserStore::open).
///
/// Every field has a default, so a partial JSON object deserializes:
///
/// ```
/// use userstore::StoreOptions;
///
/// let options: StoreOptions = serde_json::from_str(r#"{"collection_name": "Accounts"}"#).unwrap();
/// assert_eq!(options.collection_name, "Accounts");
/// assert_eq!(options.iterations, 10_000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    /// Derived key length of the default hasher, in bytes.
    pub key_length: usize,
    /// Iterations of the default hasher.
    pub iterations: u32,
    /// Replaces the default hasher. `key_length` and `iterations` are then unused.
    #[serde(skip)]
    pub hasher: Option<Arc<dyn HashProvider>>,
    pub collection_name: String,
    /// Default `Memberships` to an empty list on insert.
    pub memberships_array: bool,
    /// Extra indices, created before the per-field unique indices.
    pub indices: Vec<IndexSpec>,
    /// Only hash these fields among those the schema marks hashable.
    pub hash_only: Option<BTreeSet<String>>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            key_length: DEFAULT_KEY_LENGTH,
            iterations: DEFAULT_ITERATIONS,
            hasher: None,
            collection_name: DEFAULT_COLLECTION.to_string(),
            memberships_array: true,
            indices: Vec::new(),
            hash_only: None,
        }
    }
}

impl StoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key_length(mut self, key_length: usize) -> Self {
        self.key_length = key_length;
        self
    }

    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_hasher(mut self, hasher: Arc<dyn HashProvider>) -> Self {
        self.hasher = Some(hasher);
        self
    }

    pub fn with_collection_name(mut self, name: impl Into<String>) -> Self {
        self.collection_name = name.into();
        self
    }

    pub fn with_memberships_array(mut self, enabled: bool) -> Self {
        self.memberships_array = enabled;
        self
    }

    pub fn with_index(mut self, index: IndexSpec) -> Self {
        self.indices.push(index);
        self
    }

    pub fn with_hash_only<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hash_only = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// The provider hashable fields go through.
    pub fn hash_provider(&self) -> Arc<dyn HashProvider> {
        match &self.hasher {
            Some(hasher) => Arc::clone(hasher),
            None => Arc::new(Pbkdf2Hasher::new(self.key_length, self.iterations)),
        }
    }

    /// Rejects values no store can be opened with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |name: &str, reason: &str| -> Result<()> {
            Err(StoreError::InvalidOption {
                name: name.to_string(),
                reason: reason.to_string(),
            }
            .into())
        };

        if self.hasher.is_none() {
            if self.key_length == 0 {
                return invalid("key_length", "must be at least 1");
            }
            if self.iterations == 0 {
                return invalid("iterations", "must be at least 1");
            }
        }
        if self.collection_name.is_empty() {
            return invalid("collection_name", "must not be empty");
        }
        if self.indices.iter().any(|index| index.fields.is_empty()) {
            return invalid("indices", "every index needs at least one field");
        }
        Ok(())
    }
}
