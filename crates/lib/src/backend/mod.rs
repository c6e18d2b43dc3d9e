//! Backend implementations for userstore
//!
//! This module provides the `Backend` trait and the backend implementations,
//! organized by category (currently only `database`).
//!
//! The `Backend` trait is the interface to the document store holding the users
//! collection. The store facade never depends on a concrete store: it only issues
//! the operations below, with the filter and update semantics defined in
//! [`filter`]. Uniqueness is a property of the store's indices; a backend must
//! report index violations as an error for which
//! [`BackendError::is_duplicate_key`] returns `true`.

use std::any::Any;
use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::document::{Document, Value};

// Category modules
pub mod database;
pub mod errors;
pub mod filter;

pub use errors::BackendError;

/// An index to create on a collection.
///
/// Serialized as `{"fields": ["FirstName", "LastName"], "unique": true}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    /// Indexed fields, in key order.
    pub fields: Vec<String>,
    /// Reject two documents with the same key.
    #[serde(default)]
    pub unique: bool,
    /// Skip documents missing every indexed field.
    #[serde(default)]
    pub sparse: bool,
}

impl IndexSpec {
    /// A plain, non-unique index.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            unique: false,
            sparse: false,
        }
    }

    /// A unique index.
    pub fn unique<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            unique: true,
            ..Self::new(fields)
        }
    }

    /// Marks the index sparse.
    pub fn sparse(mut self) -> Self {
        self.sparse = true;
        self
    }

    /// Index name, derived from its fields (`FirstName_1_LastName_1`).
    pub fn name(&self) -> String {
        self.fields
            .iter()
            .map(|field| format!("{field}_1"))
            .collect::<Vec<_>>()
            .join("_")
    }
}

/// A single atomic update against one document.
///
/// Applied in order: `set`, then `add_to_set` (set union), then `pull` (set difference).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOp {
    /// Fields to overwrite.
    pub set: Document,
    /// Values to add to list fields, skipping values already present.
    pub add_to_set: BTreeMap<String, Vec<Value>>,
    /// Values to remove from list fields.
    pub pull: BTreeMap<String, Vec<Value>>,
}

impl UpdateOp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites every field of `fields`.
    pub fn set(mut self, fields: Document) -> Self {
        self.set = fields;
        self
    }

    pub fn add_to_set(mut self, field: impl Into<String>, values: Vec<Value>) -> Self {
        self.add_to_set.entry(field.into()).or_default().extend(values);
        self
    }

    pub fn pull(mut self, field: impl Into<String>, values: Vec<Value>) -> Self {
        self.pull.entry(field.into()).or_default().extend(values);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.add_to_set.is_empty() && self.pull.is_empty()
    }
}

/// Result of [`Backend::update_one`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOutcome {
    /// Number of documents the update was applied to (0 or 1).
    pub matched: u64,
    /// The post-update document, when requested and matched.
    pub document: Option<Document>,
}

/// Document store abstraction for the users collection.
///
/// All backends must be `Send` and `Sync` so a single handle can be shared by every
/// operation of a store, and implement `Any` to allow downcasting (e.g. to persist an
/// `InMemory` backend on shutdown).
///
/// Filters use the semantics of [`filter::matches`]. Updates use the semantics of
/// [`filter::apply_update`].
#[async_trait]
pub trait Backend: Send + Sync + Any {
    /// Creates `collection` if it does not exist yet. Idempotent.
    async fn create_collection(&self, collection: &str) -> Result<()>;

    /// Creates `index` on `collection` if an index with the same name does not exist. Idempotent.
    async fn create_index(&self, collection: &str, index: &IndexSpec) -> Result<()>;

    /// Returns the first document matching `filter`, in insertion order.
    async fn find_one(&self, collection: &str, filter: &Document) -> Result<Option<Document>>;

    /// Stores `document`, assigning its primary key, and returns the stored document.
    ///
    /// Fails with a duplicate-key error when a unique index would be violated.
    async fn insert(&self, collection: &str, document: Document) -> Result<Document>;

    /// Applies `update` to the first document matching `filter`.
    ///
    /// When `return_document` is set, the outcome carries the post-update document.
    /// Fails with a duplicate-key error when a unique index would be violated, in
    /// which case the stored document is left unchanged.
    async fn update_one(
        &self,
        collection: &str,
        filter: &Document,
        update: &UpdateOp,
        return_document: bool,
    ) -> Result<UpdateOutcome>;

    /// Deletes every document matching `filter`, returning how many were removed.
    async fn delete_many(&self, collection: &str, filter: &Document) -> Result<u64>;

    /// Counts the documents matching `filter`.
    async fn count(&self, collection: &str, filter: &Document) -> Result<u64>;

    /// Returns a reference to the backend instance as a dynamic `Any` type.
    fn as_any(&self) -> &dyn Any;
}
