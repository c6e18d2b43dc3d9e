//! The users collection.
//!
//! [`UserStore`] composes the pieces of this module into the operation surface:
//!
//! 1. [`ConstraintEnforcer`] rejects payloads that miss or clear required fields;
//! 2. hashable payload fields are replaced by hash records;
//! 3. [`Reconciler`] verifies plaintext hashed values in the filter and resolves the
//!    exact stored document to target;
//! 4. the mutation is dispatched to the [`Backend`] and its result normalized.
//!
//! Each step runs only if the previous one succeeded. A filter whose hashed values do
//! not verify behaves exactly like a filter matching nothing: `0` or `None`.
//!
//! Reconciliation and mutation are two separate store calls. Because the mutation is
//! filtered by the full stored document, a record modified in between is not matched
//! and the operation reports no match.

mod constraints;
mod errors;
mod mutation;
mod options;
mod reconcile;

use std::sync::Arc;

use tokio::sync::OnceCell;

pub use constraints::ConstraintEnforcer;
pub use errors::{ConstraintError, StoreError};
pub use mutation::MembershipOp;
pub use options::StoreOptions;
pub use reconcile::{Reconciler, Reconciliation};

use crate::Result;
use crate::backend::{Backend, UpdateOp, UpdateOutcome};
use crate::constants::MEMBERSHIPS;
use crate::document::{Document, Value};
use crate::hash::HashProvider;
use crate::schema::{FieldRules, Schema};

/// A users collection with constraint enforcement and hashed-field verification.
///
/// Cheap to share behind an `Arc`; every operation takes `&self`.
pub struct UserStore {
    backend: Arc<dyn Backend>,
    collection: String,
    rules: FieldRules,
    enforcer: ConstraintEnforcer,
    hasher: Arc<dyn HashProvider>,
    memberships_array: bool,
    dependencies: OnceCell<()>,
}

impl std::fmt::Debug for UserStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserStore")
            .field("collection", &self.collection)
            .field("rules", &self.rules)
            .field("hasher", &self.hasher)
            .field("memberships_array", &self.memberships_array)
            .finish_non_exhaustive()
    }
}

impl UserStore {
    /// Opens a store over `backend`, creating its collection and indices.
    ///
    /// The schema is read once: later changes to it have no effect on this store.
    pub async fn open(
        backend: Arc<dyn Backend>,
        schema: &Schema,
        options: StoreOptions,
    ) -> Result<Self> {
        options.validate()?;
        let rules = schema.rules(options.hash_only.as_ref(), &options.indices);
        let store = Self {
            enforcer: ConstraintEnforcer::new(rules.required().clone()),
            hasher: options.hash_provider(),
            collection: options.collection_name,
            memberships_array: options.memberships_array,
            backend,
            rules,
            dependencies: OnceCell::new(),
        };
        store.ensure_dependencies().await?;
        Ok(store)
    }

    /// Creates the collection and every index, once.
    ///
    /// Later calls return immediately. A failed attempt is retried by the next call.
    pub async fn ensure_dependencies(&self) -> Result<()> {
        self.dependencies
            .get_or_try_init(|| async {
                self.backend.create_collection(&self.collection).await?;
                for index in self.rules.indices() {
                    self.backend.create_index(&self.collection, index).await?;
                }
                tracing::info!(
                    collection = %self.collection,
                    indices = self.rules.indices().len(),
                    "Users collection ready"
                );
                Ok::<(), crate::Error>(())
            })
            .await?;
        Ok(())
    }

    pub fn collection_name(&self) -> &str {
        &self.collection
    }

    /// Required and hashable fields plus indices, as derived when the store opened.
    pub fn field_rules(&self) -> &FieldRules {
        &self.rules
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    fn reconciler(&self) -> Reconciler<'_> {
        Reconciler {
            backend: self.backend.as_ref(),
            collection: &self.collection,
            rules: &self.rules,
            hasher: self.hasher.as_ref(),
        }
    }

    async fn prepare_insert(&self, user: Document) -> Result<Document> {
        let mut user = mutation::hash_payload(self.hasher.as_ref(), &self.rules, user).await?;
        if self.memberships_array && !user.contains_field(MEMBERSHIPS) {
            user.insert(MEMBERSHIPS, Value::Array(Vec::new()));
        }
        Ok(user)
    }

    /// Inserts a user, returning the stored document with its `_id`.
    ///
    /// # Errors
    ///
    /// * `ConstraintError::NotNull` if a required field is missing or null.
    /// * `ConstraintError::Unique` if a unique index rejects the user.
    pub async fn add(&self, user: Document) -> Result<Document> {
        self.enforcer.check_insert(&user)?;
        let user = self.prepare_insert(user).await?;
        tracing::debug!(collection = %self.collection, "Inserting user");
        self.backend
            .insert(&self.collection, user)
            .await
            .map_err(mutation::retag_unique)
    }

    /// Inserts several users in order.
    ///
    /// Every user is checked against the required fields before anything is written.
    /// Insertion stops at the first failure; users inserted before it stay inserted.
    pub async fn add_many(&self, users: Vec<Document>) -> Result<Vec<Document>> {
        for user in &users {
            self.enforcer.check_insert(user)?;
        }
        let mut inserted = Vec::with_capacity(users.len());
        for user in users {
            let user = self.prepare_insert(user).await?;
            let stored = self
                .backend
                .insert(&self.collection, user)
                .await
                .map_err(mutation::retag_unique)?;
            inserted.push(stored);
        }
        Ok(inserted)
    }

    /// Returns the first user matching `filter`, verifying hashed values.
    pub async fn get(&self, filter: &Document) -> Result<Option<Document>> {
        match self.reconciler().reconcile(filter).await? {
            Reconciliation::Matched(user) => Ok(Some(user)),
            Reconciliation::Unguarded => self.backend.find_one(&self.collection, filter).await,
            Reconciliation::NoMatch => Ok(None),
        }
    }

    /// Removes the users matching `filter`, returning how many were removed.
    ///
    /// With hashed values in the filter, only the verified user is removed.
    pub async fn remove(&self, filter: &Document) -> Result<u64> {
        let Some(target) = self.reconciler().reconcile(filter).await?.into_filter(filter) else {
            return Ok(0);
        };
        tracing::debug!(collection = %self.collection, "Removing users");
        self.backend.delete_many(&self.collection, &target).await
    }

    /// Counts the users matching `filter` as given. Hashed values are not verified.
    pub async fn count(&self, filter: &Document) -> Result<u64> {
        self.backend.count(&self.collection, filter).await
    }

    /// Sets the fields of `updates` on the user matching `filter`.
    ///
    /// Returns the number of users updated (0 or 1).
    pub async fn update(&self, filter: &Document, updates: Document) -> Result<u64> {
        let outcome = self.dispatch_update(filter, updates, None, false).await?;
        Ok(outcome.matched)
    }

    /// Like [`update`](Self::update), returning the updated user.
    pub async fn update_get(
        &self,
        filter: &Document,
        updates: Document,
    ) -> Result<Option<Document>> {
        let outcome = self.dispatch_update(filter, updates, None, true).await?;
        Ok(outcome.document)
    }

    /// Sets `updates` and applies `membership` in one atomic store update.
    pub async fn update_atomic(
        &self,
        filter: &Document,
        updates: Document,
        membership: MembershipOp,
    ) -> Result<u64> {
        let outcome = self
            .dispatch_update(filter, updates, Some(membership), false)
            .await?;
        Ok(outcome.matched)
    }

    /// Like [`update_atomic`](Self::update_atomic), returning the updated user.
    pub async fn update_get_atomic(
        &self,
        filter: &Document,
        updates: Document,
        membership: MembershipOp,
    ) -> Result<Option<Document>> {
        let outcome = self
            .dispatch_update(filter, updates, Some(membership), true)
            .await?;
        Ok(outcome.document)
    }

    /// Adds `memberships` to the user matching `filter`, as a set.
    pub async fn add_membership<I, S>(&self, filter: &Document, memberships: I) -> Result<u64>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.change_membership(filter, MembershipOp::add(memberships))
            .await
    }

    /// Removes `memberships` from the user matching `filter`.
    pub async fn remove_membership<I, S>(&self, filter: &Document, memberships: I) -> Result<u64>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.change_membership(filter, MembershipOp::remove(memberships))
            .await
    }

    async fn change_membership(&self, filter: &Document, op: MembershipOp) -> Result<u64> {
        let Some(target) = self.reconciler().reconcile(filter).await?.into_filter(filter) else {
            return Ok(0);
        };
        let update = op.apply_to(UpdateOp::new());
        let outcome = self
            .backend
            .update_one(&self.collection, &target, &update, false)
            .await
            .map_err(mutation::retag_unique)?;
        Ok(outcome.matched)
    }

    async fn dispatch_update(
        &self,
        filter: &Document,
        updates: Document,
        membership: Option<MembershipOp>,
        return_document: bool,
    ) -> Result<UpdateOutcome> {
        self.enforcer.check_update(&updates)?;
        let updates = mutation::hash_payload(self.hasher.as_ref(), &self.rules, updates).await?;

        let Some(target) = self.reconciler().reconcile(filter).await?.into_filter(filter) else {
            return Ok(UpdateOutcome::default());
        };

        let mut update = UpdateOp::new().set(updates);
        if let Some(op) = membership {
            update = op.apply_to(update);
        }

        tracing::debug!(collection = %self.collection, return_document, "Updating user");
        self.backend
            .update_one(&self.collection, &target, &update, return_document)
            .await
            .map_err(mutation::retag_unique)
    }
}
