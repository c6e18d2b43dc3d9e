//! In-memory database backend implementation
//!
//! This module provides an in-memory implementation of the Backend trait,
//! suitable for testing, development, or scenarios where data persistence
//! is not strictly required or is handled externally.

mod persistence;

use std::any::Any;
use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::Result;
use crate::backend::errors::BackendError;
use crate::backend::filter::{
    apply_update, check_field_name, check_fields, check_update_fields, index_key, keys_equal,
    matches,
};
use crate::backend::{Backend, IndexSpec, UpdateOp, UpdateOutcome};
use crate::constants::{DUPLICATE_KEY_CODE, ID_FIELD};
use crate::document::{Document, Value};

/// Name reported when two documents share a primary key.
const ID_INDEX: &str = "_id_";

/// One collection: documents in insertion order plus its declared indices.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Collection {
    pub(crate) documents: Vec<Document>,
    #[serde(default)]
    pub(crate) indices: Vec<IndexSpec>,
}

impl Collection {
    /// Fails if `candidate` collides with any document other than the one at `skip`.
    fn check_unique(&self, candidate: &Document, skip: Option<usize>) -> Result<()> {
        let others = || {
            self.documents
                .iter()
                .enumerate()
                .filter(move |(i, _)| Some(*i) != skip)
                .map(|(_, doc)| doc)
        };

        if let Some(id) = candidate.id()
            && others().any(|doc| doc.id() == Some(id))
        {
            return Err(duplicate(ID_INDEX.to_string()));
        }

        for index in self.indices.iter().filter(|index| index.unique) {
            let Some(key) = index_key(candidate, index) else {
                continue;
            };
            let collides = others()
                .filter_map(|doc| index_key(doc, index))
                .any(|other| keys_equal(&key, &other));
            if collides {
                return Err(duplicate(index.name()));
            }
        }
        Ok(())
    }
}

fn duplicate(index: String) -> crate::Error {
    BackendError::DuplicateKey {
        index,
        code: DUPLICATE_KEY_CODE,
    }
    .into()
}

/// A simple in-memory document store.
///
/// Collections are created on first use. Primary keys are random UUID strings stored
/// in the `_id` field. Unique and sparse indices are enforced on every write.
///
/// It provides basic persistence via `save_to_file` and `load_from_file`,
/// serializing every collection to JSON.
#[derive(Debug, Default)]
pub struct InMemory {
    pub(crate) collections: RwLock<BTreeMap<String, Collection>>,
}

impl InMemory {
    /// Creates a new, empty `InMemory` database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of every collection created so far.
    pub async fn collection_names(&self) -> Vec<String> {
        self.collections.read().await.keys().cloned().collect()
    }

    /// Indices declared on `collection`.
    pub async fn indices(&self, collection: &str) -> Vec<IndexSpec> {
        self.collections
            .read()
            .await
            .get(collection)
            .map(|c| c.indices.clone())
            .unwrap_or_default()
    }

    /// Every stored document of `collection`, exactly as stored.
    pub async fn documents(&self, collection: &str) -> Vec<Document> {
        self.collections
            .read()
            .await
            .get(collection)
            .map(|c| c.documents.clone())
            .unwrap_or_default()
    }

    /// Saves every collection to a specified file as JSON.
    ///
    /// # Arguments
    /// * `path` - The path to the file where the state should be saved.
    ///
    /// # Returns
    /// A `Result` indicating success or an I/O or serialization error.
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        persistence::save_to_file(self, path).await
    }

    /// Loads the database state from a specified JSON file.
    ///
    /// If the file does not exist, a new, empty `InMemory` database is returned.
    ///
    /// # Arguments
    /// * `path` - The path to the file from which to load the state.
    ///
    /// # Returns
    /// A `Result` containing the loaded `InMemory` database or an I/O or deserialization error.
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        persistence::load_from_file(path).await
    }
}

#[async_trait]
impl Backend for InMemory {
    async fn create_collection(&self, collection: &str) -> Result<()> {
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default();
        Ok(())
    }

    async fn create_index(&self, collection: &str, index: &IndexSpec) -> Result<()> {
        index
            .fields
            .iter()
            .try_for_each(|field| check_field_name(field))?;
        let mut collections = self.collections.write().await;
        let coll = collections.entry(collection.to_string()).or_default();
        let name = index.name();
        if coll.indices.iter().any(|existing| existing.name() == name) {
            return Ok(());
        }

        // Building a unique index over colliding documents fails, like any other write
        if index.unique {
            let keys: Vec<Vec<Value>> = coll
                .documents
                .iter()
                .filter_map(|doc| index_key(doc, index))
                .collect();
            for (i, key) in keys.iter().enumerate() {
                if keys[i + 1..].iter().any(|other| keys_equal(key, other)) {
                    return Err(duplicate(name));
                }
            }
        }

        tracing::debug!(collection, index = %name, "Created index");
        coll.indices.push(index.clone());
        Ok(())
    }

    async fn find_one(&self, collection: &str, filter: &Document) -> Result<Option<Document>> {
        check_fields(filter)?;
        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|coll| {
            coll.documents
                .iter()
                .find(|doc| matches(doc, filter))
                .cloned()
        }))
    }

    async fn insert(&self, collection: &str, mut document: Document) -> Result<Document> {
        check_fields(&document)?;
        if !document.has_value(ID_FIELD) {
            document.insert(ID_FIELD, uuid::Uuid::new_v4().to_string());
        }

        let mut collections = self.collections.write().await;
        let coll = collections.entry(collection.to_string()).or_default();
        coll.check_unique(&document, None)?;
        coll.documents.push(document.clone());
        Ok(document)
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Document,
        update: &UpdateOp,
        return_document: bool,
    ) -> Result<UpdateOutcome> {
        check_fields(filter)?;
        check_update_fields(update)?;
        let mut collections = self.collections.write().await;
        let Some(coll) = collections.get_mut(collection) else {
            return Ok(UpdateOutcome::default());
        };
        let Some(position) = coll.documents.iter().position(|doc| matches(doc, filter)) else {
            return Ok(UpdateOutcome::default());
        };

        let mut updated = coll.documents[position].clone();
        apply_update(&mut updated, update)?;
        coll.check_unique(&updated, Some(position))?;
        coll.documents[position] = updated;

        Ok(UpdateOutcome {
            matched: 1,
            document: return_document.then(|| coll.documents[position].clone()),
        })
    }

    async fn delete_many(&self, collection: &str, filter: &Document) -> Result<u64> {
        check_fields(filter)?;
        let mut collections = self.collections.write().await;
        let Some(coll) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = coll.documents.len();
        coll.documents.retain(|doc| !matches(doc, filter));
        Ok((before - coll.documents.len()) as u64)
    }

    async fn count(&self, collection: &str, filter: &Document) -> Result<u64> {
        check_fields(filter)?;
        let collections = self.collections.read().await;
        Ok(collections.get(collection).map_or(0, |coll| {
            coll.documents
                .iter()
                .filter(|doc| matches(doc, filter))
                .count() as u64
        }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
