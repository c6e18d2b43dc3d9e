//! Required-field checks, run before any hashing or store I/O.

use std::collections::BTreeSet;

use super::ConstraintError;
use crate::Result;
use crate::document::Document;

/// Checks documents against the `NotNull` set of a store.
#[derive(Debug, Clone, Default)]
pub struct ConstraintEnforcer {
    required: BTreeSet<String>,
}

impl ConstraintEnforcer {
    pub fn new(required: BTreeSet<String>) -> Self {
        Self { required }
    }

    /// True if every required field is present and non-null in `document`.
    pub fn enforce_required(&self, document: &Document) -> bool {
        self.required.iter().all(|field| document.has_value(field))
    }

    /// True if `update` leaves every required field alone or sets it to a non-null value.
    pub fn enforce_required_on_update(&self, update: &Document) -> bool {
        self.required
            .iter()
            .all(|field| !update.contains_field(field) || update.has_value(field))
    }

    /// Required fields absent or null in `document`.
    pub fn missing_required(&self, document: &Document) -> Vec<String> {
        self.required
            .iter()
            .filter(|field| !document.has_value(field))
            .cloned()
            .collect()
    }

    /// Required fields that `update` would set to null.
    pub fn cleared_required(&self, update: &Document) -> Vec<String> {
        self.required
            .iter()
            .filter(|field| update.contains_field(field) && !update.has_value(field))
            .cloned()
            .collect()
    }

    /// Gate for inserts.
    pub fn check_insert(&self, document: &Document) -> Result<()> {
        if self.enforce_required(document) {
            return Ok(());
        }
        Err(ConstraintError::NotNull {
            fields: self.missing_required(document),
        }
        .into())
    }

    /// Gate for partial updates.
    pub fn check_update(&self, update: &Document) -> Result<()> {
        if self.enforce_required_on_update(update) {
            return Ok(());
        }
        Err(ConstraintError::NotNull {
            fields: self.cleared_required(update),
        }
        .into())
    }
}
