//! Hashed-field reconciliation.
//!
//! A filter may carry plaintext values for hashable fields (`{"Email": .., "Password": "p"}`).
//! Those cannot be matched by the store, so the reconciler looks the record up by the
//! remaining fields and verifies each plaintext against the stored hash record. Only
//! a full match lets the operation proceed, and it then targets the exact stored
//! document.

use crate::Result;
use crate::backend::Backend;
use crate::document::{Document, Value};
use crate::hash::{HashError, HashProvider};
use crate::schema::FieldRules;

/// Outcome of reconciling a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    /// The filter has no hashed values to verify; use it as given.
    Unguarded,
    /// Every hashed value verified against this stored document.
    Matched(Document),
    /// No record, or a hashed value did not verify.
    NoMatch,
}

impl Reconciliation {
    pub fn is_match(&self) -> bool {
        !matches!(self, Reconciliation::NoMatch)
    }

    /// The stored document the operation must target, if reconciliation found one.
    pub fn canonical(&self) -> Option<&Document> {
        match self {
            Reconciliation::Matched(document) => Some(document),
            _ => None,
        }
    }

    /// The filter to hand to the store, or `None` when the operation must not proceed.
    pub fn into_filter(self, filter: &Document) -> Option<Document> {
        match self {
            Reconciliation::Unguarded => Some(filter.clone()),
            Reconciliation::Matched(document) => Some(document),
            Reconciliation::NoMatch => None,
        }
    }
}

/// Verifies plaintext hashed fields of filters against stored records.
pub struct Reconciler<'a> {
    pub(crate) backend: &'a dyn Backend,
    pub(crate) collection: &'a str,
    pub(crate) rules: &'a FieldRules,
    pub(crate) hasher: &'a dyn HashProvider,
}

impl Reconciler<'_> {
    pub async fn reconcile(&self, filter: &Document) -> Result<Reconciliation> {
        let (candidates, plain) = filter
            .clone()
            .partition(|field, value| self.rules.is_hashable(field) && !value.is_null());

        if candidates.is_empty() {
            return Ok(Reconciliation::Unguarded);
        }

        // Checked before the lookup so the outcome does not depend on whether a record exists
        let mut plaintexts = Vec::with_capacity(candidates.len());
        for (field, value) in &candidates {
            let Value::String(plaintext) = value else {
                return Err(HashError::UnsupportedValue {
                    field: field.clone(),
                }
                .into());
            };
            plaintexts.push((field, plaintext));
        }

        let Some(stored) = self.backend.find_one(self.collection, &plain).await? else {
            tracing::debug!(collection = self.collection, "No record for reconciled filter");
            return Ok(Reconciliation::NoMatch);
        };

        // Document iteration is ordered by field name
        for (field, plaintext) in plaintexts {
            let Some(record) = stored.get_str(field) else {
                tracing::debug!(field = %field, "Stored record has no hash for field");
                return Ok(Reconciliation::NoMatch);
            };
            if !self.hasher.verify(plaintext, record).await? {
                tracing::debug!(field = %field, "Hashed field did not verify");
                return Ok(Reconciliation::NoMatch);
            }
        }

        Ok(Reconciliation::Matched(stored))
    }
}
