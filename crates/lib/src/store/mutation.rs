//! Building and normalizing store mutations.

use futures::future::try_join_all;

use super::ConstraintError;
use crate::Result;
use crate::backend::UpdateOp;
use crate::constants::MEMBERSHIPS;
use crate::document::{Document, Value};
use crate::hash::{HashError, HashProvider};
use crate::schema::FieldRules;

/// A set operation on the `Memberships` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipOp {
    /// Set union.
    Add(Vec<String>),
    /// Set difference.
    Remove(Vec<String>),
}

impl MembershipOp {
    pub fn add<I, S>(memberships: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MembershipOp::Add(memberships.into_iter().map(Into::into).collect())
    }

    pub fn remove<I, S>(memberships: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MembershipOp::Remove(memberships.into_iter().map(Into::into).collect())
    }

    /// Folds this operation into `update`.
    pub(crate) fn apply_to(self, update: UpdateOp) -> UpdateOp {
        match self {
            MembershipOp::Add(values) => update.add_to_set(MEMBERSHIPS, to_values(values)),
            MembershipOp::Remove(values) => update.pull(MEMBERSHIPS, to_values(values)),
        }
    }
}

fn to_values(memberships: Vec<String>) -> Vec<Value> {
    memberships.into_iter().map(Value::String).collect()
}

/// Replaces every non-null hashable field of `payload` with its hash record.
///
/// Fields are hashed concurrently and joined once; the first failure fails the payload.
pub(crate) async fn hash_payload(
    hasher: &dyn HashProvider,
    rules: &FieldRules,
    payload: Document,
) -> Result<Document> {
    let (hashable, mut rest) =
        payload.partition(|field, value| rules.is_hashable(field) && !value.is_null());
    if hashable.is_empty() {
        return Ok(rest);
    }

    let pending = hashable
        .into_iter()
        .map(|(field, value)| hash_field(hasher, field, value));

    for (field, record) in try_join_all(pending).await? {
        rest.insert(field, record);
    }
    Ok(rest)
}

async fn hash_field(
    hasher: &dyn HashProvider,
    field: String,
    value: Value,
) -> Result<(String, String)> {
    let Value::String(plaintext) = value else {
        return Err(HashError::UnsupportedValue { field }.into());
    };
    let record = hasher.hash(&plaintext).await?;
    Ok((field, record))
}

/// Re-tags duplicate-key failures as unique constraint violations.
pub(crate) fn retag_unique(err: crate::Error) -> crate::Error {
    match err {
        crate::Error::Backend(source) if source.is_duplicate_key() => {
            tracing::debug!(error = %source, "Unique constraint violated");
            ConstraintError::Unique { source }.into()
        }
        other => other,
    }
}
