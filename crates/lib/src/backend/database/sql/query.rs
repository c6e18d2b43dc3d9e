//! Filter compilation.
//!
//! Translates a filter document into a `WHERE` clause over the `doc` column that
//! agrees with [`crate::backend::filter::matches`]:
//!
//! * `null` matches rows where `json_type` is absent or `'null'`;
//! * scalars match through `json_each`, which yields the value itself for scalars
//!   and each element for lists;
//! * lists and objects compare their minified JSON text.

use sqlx::{QueryBuilder, Sqlite};

use crate::Result;
use crate::backend::errors::BackendError;
use crate::document::{Document, Value};

use super::schema::json_path;

/// Appends ` WHERE ...` for `filter` to `builder`. An empty filter appends nothing.
pub fn push_where(builder: &mut QueryBuilder<'_, Sqlite>, filter: &Document) -> Result<()> {
    for (i, (field, expected)) in filter.iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        push_condition(builder, json_path(field)?, expected)?;
    }
    Ok(())
}

fn push_condition(
    builder: &mut QueryBuilder<'_, Sqlite>,
    path: String,
    expected: &Value,
) -> Result<()> {
    match expected {
        Value::Null => {
            builder
                .push("ifnull(json_type(doc, ")
                .push_bind(path)
                .push("), 'null') = 'null'");
        }
        Value::Array(_) | Value::Object(_) => {
            let kind = if expected.is_array() { "array" } else { "object" };
            let text = serde_json::to_string(expected)
                .map_err(|e| BackendError::SerializationFailed { source: e })?;
            builder
                .push("(json_type(doc, ")
                .push_bind(path.clone())
                .push(") = ")
                .push_bind(kind)
                .push(" AND json_extract(doc, ")
                .push_bind(path)
                .push(") = json(")
                .push_bind(text)
                .push("))");
        }
        Value::Bool(flag) => {
            builder
                .push("EXISTS (SELECT 1 FROM json_each(doc, ")
                .push_bind(path)
                .push(") WHERE type = ")
                .push_bind(if *flag { "true" } else { "false" })
                .push(")");
        }
        Value::Number(number) => {
            builder
                .push("EXISTS (SELECT 1 FROM json_each(doc, ")
                .push_bind(path)
                .push(") WHERE type IN ('integer', 'real') AND atom = ");
            match number.as_i64() {
                Some(int) => builder.push_bind(int),
                None => builder.push_bind(number.as_f64().unwrap_or(f64::NAN)),
            };
            builder.push(")");
        }
        Value::String(text) => {
            builder
                .push("EXISTS (SELECT 1 FROM json_each(doc, ")
                .push_bind(path)
                .push(") WHERE type = 'text' AND atom = ")
                .push_bind(text.clone())
                .push(")");
        }
    }
    Ok(())
}
