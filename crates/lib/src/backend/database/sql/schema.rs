//! SQL schema definitions.
//!
//! Each collection is a table of JSON documents:
//!
//! ```sql
//! CREATE TABLE "Users" (id TEXT PRIMARY KEY NOT NULL, doc TEXT NOT NULL)
//! ```
//!
//! `id` mirrors the document's `_id` field. Indices are expression indices over
//! `json_extract`, so no column exists per user field.
//!
//! Identifiers and JSON paths cannot be bound as parameters in DDL, so every name
//! that ends up inlined goes through [`quote_ident`] or [`sql_literal`] first.
//! Queries bind their paths.

use crate::Result;
use crate::backend::IndexSpec;
use crate::backend::errors::BackendError;
use crate::backend::filter::check_field_name;

use super::{SqliteBackend, SqlxResultExt};

/// Current schema version.
///
/// Increment this when the table layout changes in a way old files cannot be read.
pub const SCHEMA_VERSION: i64 = 1;

const CREATE_VERSION_TABLE: &str = "CREATE TABLE IF NOT EXISTS schema_version (
    version BIGINT PRIMARY KEY
)";

/// Initialize the database schema.
///
/// Records the schema version on first use and refuses databases written by a
/// newer version.
pub async fn initialize(backend: &SqliteBackend) -> Result<()> {
    let pool = backend.pool();

    sqlx::query(CREATE_VERSION_TABLE)
        .execute(pool)
        .await
        .sql_context("Schema creation failed")?;

    let row: Option<(i64,)> = sqlx::query_as("SELECT version FROM schema_version")
        .fetch_optional(pool)
        .await
        .sql_context("Failed to check schema version")?;

    match row {
        None => {
            sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
                .bind(SCHEMA_VERSION)
                .execute(pool)
                .await
                .sql_context("Failed to initialize schema version")?;
        }
        Some((version,)) if version > SCHEMA_VERSION => {
            return Err(BackendError::SqlxError {
                reason: format!(
                    "Database schema v{version} is newer than supported v{SCHEMA_VERSION}"
                ),
                source: None,
            }
            .into());
        }
        Some(_) => {}
    }
    Ok(())
}

/// Quotes a collection or index name for use as an SQL identifier.
pub fn quote_ident(name: &str) -> Result<String> {
    if name.is_empty() || name.contains(['"', '\0']) {
        return Err(BackendError::InvalidFieldName {
            field: name.to_string(),
        }
        .into());
    }
    Ok(format!("\"{name}\""))
}

/// JSON path addressing the top-level `field` of a document.
///
/// The label is quoted so that dots and brackets in field names are taken literally.
/// SQLite reads a quoted label up to the next double quote, which is why
/// [`check_field_name`] refuses names containing one.
pub fn json_path(field: &str) -> Result<String> {
    check_field_name(field)?;
    Ok(format!("$.\"{field}\""))
}

/// `text` as an SQL string literal.
pub fn sql_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// DDL for a collection table. `table` must already be quoted.
pub fn create_collection_sql(table: &str) -> String {
    format!("CREATE TABLE IF NOT EXISTS {table} (id TEXT PRIMARY KEY NOT NULL, doc TEXT NOT NULL)")
}

/// DDL for `index` on `collection`.
///
/// Keys use `json_quote(json_extract(..))`, under which a missing field and an
/// explicit `null` produce the same key. Sparse indices are partial indices that skip
/// rows missing every indexed field.
pub fn create_index_sql(collection: &str, index: &IndexSpec) -> Result<String> {
    if index.fields.is_empty() {
        return Err(BackendError::InvalidUpdate {
            reason: "an index needs at least one field".to_string(),
        }
        .into());
    }

    let table = quote_ident(collection)?;
    let name = quote_ident(&format!("{collection}.{}", index.name()))?;
    let paths = index
        .fields
        .iter()
        .map(|field| json_path(field).map(|path| sql_literal(&path)))
        .collect::<Result<Vec<_>>>()?;

    let keys = paths
        .iter()
        .map(|path| format!("json_quote(json_extract(doc, {path}))"))
        .collect::<Vec<_>>()
        .join(", ");
    let unique = if index.unique { "UNIQUE " } else { "" };

    let mut sql = format!("CREATE {unique}INDEX IF NOT EXISTS {name} ON {table} ({keys})");
    if index.sparse {
        let present = paths
            .iter()
            .map(|path| format!("json_type(doc, {path}) IS NOT NULL"))
            .collect::<Vec<_>>()
            .join(" OR ");
        sql.push_str(" WHERE ");
        sql.push_str(&present);
    }
    Ok(sql)
}
