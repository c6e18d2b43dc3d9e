//! Document storage operations for the SQLite backend.
//!
//! This module implements the CRUD operations of the `Backend` trait using sqlx.

use sqlx::{QueryBuilder, Sqlite};

use crate::Result;
use crate::backend::errors::BackendError;
use crate::backend::filter::{apply_update, check_fields, check_update_fields};
use crate::backend::{IndexSpec, UpdateOp, UpdateOutcome};
use crate::constants::ID_FIELD;
use crate::document::{Document, Value};

use super::{SqliteBackend, SqlxResultExt, query, schema};

/// Attempts made by `update_one` before giving up on a contended row.
const MAX_UPDATE_ATTEMPTS: usize = 16;

fn parse(json: &str) -> Result<Document> {
    Ok(serde_json::from_str(json).map_err(|e| BackendError::DeserializationFailed { source: e })?)
}

fn encode(document: &Document) -> Result<String> {
    Ok(serde_json::to_string(document)
        .map_err(|e| BackendError::SerializationFailed { source: e })?)
}

/// Text stored in the `id` column for a document's `_id`.
fn id_text(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Create an index on a collection.
pub async fn create_index(backend: &SqliteBackend, collection: &str, index: &IndexSpec) -> Result<()> {
    backend.table(collection).await?;
    let sql = schema::create_index_sql(collection, index)?;
    sqlx::query(&sql)
        .execute(backend.pool())
        .await
        .sql_context(&format!("Failed to create index {}", index.name()))?;
    tracing::debug!(collection, index = %index.name(), "Created index");
    Ok(())
}

/// Fetch the first document matching `filter`, in insertion order.
pub async fn find_one(
    backend: &SqliteBackend,
    collection: &str,
    filter: &Document,
) -> Result<Option<Document>> {
    Ok(find_row(backend, collection, filter)
        .await?
        .map(|(_, document)| document))
}

/// First matching row with its rowid.
async fn find_row(
    backend: &SqliteBackend,
    collection: &str,
    filter: &Document,
) -> Result<Option<(i64, Document)>> {
    let table = backend.table(collection).await?;
    let mut builder = QueryBuilder::<Sqlite>::new(format!("SELECT rowid, doc FROM {table}"));
    query::push_where(&mut builder, filter)?;
    builder.push(" ORDER BY rowid LIMIT 1");

    let row: Option<(i64, String)> = builder
        .build_query_as()
        .fetch_optional(backend.pool())
        .await
        .sql_context("Failed to find document")?;

    row.map(|(rowid, json)| Ok((rowid, parse(&json)?)))
        .transpose()
}

/// Store a document, assigning `_id` if it has none.
pub async fn insert(
    backend: &SqliteBackend,
    collection: &str,
    mut document: Document,
) -> Result<Document> {
    check_fields(&document)?;
    let table = backend.table(collection).await?;
    if !document.has_value(ID_FIELD) {
        document.insert(ID_FIELD, uuid::Uuid::new_v4().to_string());
    }
    let id = document.id().map(id_text).unwrap_or_default();

    sqlx::query(&format!("INSERT INTO {table} (id, doc) VALUES (?, ?)"))
        .bind(id)
        .bind(encode(&document)?)
        .execute(backend.pool())
        .await
        .sql_context("Failed to insert document")?;
    Ok(document)
}

/// Apply `update` to the first document matching `filter`.
///
/// The new document is computed in Rust and written back with a compare-and-swap on
/// the previous JSON text. A lost race re-reads the row and retries.
pub async fn update_one(
    backend: &SqliteBackend,
    collection: &str,
    filter: &Document,
    update: &UpdateOp,
    return_document: bool,
) -> Result<UpdateOutcome> {
    check_update_fields(update)?;
    let table = backend.table(collection).await?;

    for attempt in 0..MAX_UPDATE_ATTEMPTS {
        let Some((rowid, current)) = find_row(backend, collection, filter).await? else {
            return Ok(UpdateOutcome::default());
        };
        let previous = encode(&current)?;
        let mut updated = current;
        apply_update(&mut updated, update)?;

        let result = sqlx::query(&format!(
            "UPDATE {table} SET doc = ? WHERE rowid = ? AND doc = ?"
        ))
        .bind(encode(&updated)?)
        .bind(rowid)
        .bind(previous)
        .execute(backend.pool())
        .await
        .sql_context("Failed to update document")?;

        if result.rows_affected() == 1 {
            return Ok(UpdateOutcome {
                matched: 1,
                document: return_document.then_some(updated),
            });
        }
        tracing::debug!(collection, attempt, "Document changed during update, retrying");
    }

    Err(BackendError::Timeout {
        operation: format!("update_one on {collection}"),
    }
    .into())
}

/// Delete every document matching `filter`.
pub async fn delete_many(
    backend: &SqliteBackend,
    collection: &str,
    filter: &Document,
) -> Result<u64> {
    let table = backend.table(collection).await?;
    let mut builder = QueryBuilder::<Sqlite>::new(format!("DELETE FROM {table}"));
    query::push_where(&mut builder, filter)?;

    let result = builder
        .build()
        .execute(backend.pool())
        .await
        .sql_context("Failed to delete documents")?;
    Ok(result.rows_affected())
}

/// Count documents matching `filter`.
pub async fn count(backend: &SqliteBackend, collection: &str, filter: &Document) -> Result<u64> {
    let table = backend.table(collection).await?;
    let mut builder = QueryBuilder::<Sqlite>::new(format!("SELECT COUNT(*) FROM {table}"));
    query::push_where(&mut builder, filter)?;

    let count: i64 = builder
        .build_query_scalar()
        .fetch_one(backend.pool())
        .await
        .sql_context("Failed to count documents")?;
    Ok(count.max(0) as u64)
}
