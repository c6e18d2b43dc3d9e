//! Filter and update semantics shared by every backend.
//!
//! Filters follow the document-store conventions callers expect:
//!
//! * a `null` filter value matches a missing or null field;
//! * a scalar filter value matches an equal scalar, or a list holding an equal scalar;
//! * list and object filter values match by whole-value equality;
//! * numbers compare numerically, so `1` matches `1.0`.
//!
//! Backends that evaluate filters natively (e.g. in SQL) must agree with [`matches`],
//! and every backend refuses the same field names through [`check_field_name`].

use crate::Result;
use crate::backend::{BackendError, IndexSpec, UpdateOp};
use crate::constants::ID_FIELD;
use crate::document::{Document, Value};

/// Rejects field names that cannot be addressed as a JSON path label: empty names,
/// names containing a double quote, and names containing control characters.
pub fn check_field_name(field: &str) -> Result<()> {
    if field.is_empty() || field.contains('"') || field.contains(char::is_control) {
        return Err(BackendError::InvalidFieldName {
            field: field.to_string(),
        }
        .into());
    }
    Ok(())
}

/// Checks every top-level field name of a document or filter.
pub fn check_fields(document: &Document) -> Result<()> {
    document.iter().try_for_each(|(field, _)| check_field_name(field))
}

/// Checks every field name an update writes to.
pub fn check_update_fields(update: &UpdateOp) -> Result<()> {
    check_fields(&update.set)?;
    update
        .add_to_set
        .keys()
        .chain(update.pull.keys())
        .try_for_each(|field| check_field_name(field))
}

/// Returns true if `document` satisfies every field of `filter`.
pub fn matches(document: &Document, filter: &Document) -> bool {
    filter
        .iter()
        .all(|(field, expected)| field_matches(document.get(field), expected))
}

fn field_matches(stored: Option<&Value>, expected: &Value) -> bool {
    match expected {
        Value::Null => stored.is_none_or(Value::is_null),
        Value::Array(_) | Value::Object(_) => stored.is_some_and(|v| values_equal(v, expected)),
        scalar => match stored {
            Some(Value::Array(items)) => items.iter().any(|item| values_equal(item, scalar)),
            Some(value) => values_equal(value, scalar),
            None => false,
        },
    }
}

/// Structural equality with numeric comparison of numbers.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            x == y || matches!((x.as_f64(), y.as_f64()), (Some(x), Some(y)) if x == y)
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| values_equal(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, v)| y.get(k).is_some_and(|w| values_equal(v, w)))
        }
        _ => a == b,
    }
}

/// Applies `update` to `document` in place.
///
/// On error the document may be partially updated, so backends apply updates to a
/// copy and only commit it once index checks pass.
pub fn apply_update(document: &mut Document, update: &UpdateOp) -> Result<()> {
    for (field, value) in &update.set {
        if field == ID_FIELD && document.get(ID_FIELD).is_some_and(|id| id != value) {
            return Err(BackendError::InvalidUpdate {
                reason: format!("the {ID_FIELD} field cannot be modified"),
            }
            .into());
        }
        document.insert(field.clone(), value.clone());
    }

    for (field, values) in &update.add_to_set {
        if !document.contains_field(field) {
            document.insert(field.clone(), Value::Array(Vec::new()));
        }
        let Some(Value::Array(list)) = document.get_mut(field) else {
            return Err(non_list(field, "add values to"));
        };
        for value in values {
            if !list.iter().any(|existing| values_equal(existing, value)) {
                list.push(value.clone());
            }
        }
    }

    for (field, values) in &update.pull {
        match document.get_mut(field) {
            None => {}
            Some(Value::Array(list)) => {
                list.retain(|existing| !values.iter().any(|value| values_equal(existing, value)))
            }
            Some(_) => return Err(non_list(field, "remove values from")),
        }
    }

    Ok(())
}

fn non_list(field: &str, action: &str) -> crate::Error {
    BackendError::InvalidUpdate {
        reason: format!("cannot {action} non-list field {field:?}"),
    }
    .into()
}

/// The key `document` occupies in `index`, or `None` if a sparse index skips it.
///
/// Missing fields are keyed as `null`, so in a non-sparse unique index two documents
/// both missing a field collide.
pub fn index_key(document: &Document, index: &IndexSpec) -> Option<Vec<Value>> {
    if index.sparse && index.fields.iter().all(|f| !document.contains_field(f)) {
        return None;
    }
    Some(
        index
            .fields
            .iter()
            .map(|f| document.get(f).cloned().unwrap_or(Value::Null))
            .collect(),
    )
}

/// True if two index keys collide.
pub fn keys_equal(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
}
