//! SQLite backend implementation.
//!
//! This module provides a SQL database backend implementing the `Backend` trait,
//! storing each collection as a table of JSON documents.
//!
//! ## Architecture
//!
//! The backend uses a sqlx `SqlitePool`. Filters are compiled to SQL over SQLite's
//! JSON functions (see [`query`]), and unique indices become expression indices
//! (see [`schema`]), so SQLite itself enforces uniqueness.

mod query;
mod storage;

/// Schema definition and DDL generation.
pub mod schema;

use std::any::Any;
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use tokio::sync::RwLock;

use crate::Result;
use crate::backend::errors::BackendError;
use crate::backend::{Backend, IndexSpec, UpdateOp, UpdateOutcome};
use crate::document::Document;

/// Extension trait for sqlx Result types to simplify error handling.
///
/// Similar to `anyhow::Context`, this trait adds a method to convert
/// sqlx errors to `BackendError::SqlxError` with a context message.
pub(crate) trait SqlxResultExt<T> {
    /// Convert sqlx error to BackendError with context message.
    fn sql_context(self, context: &str) -> Result<T>;
}

impl<T> SqlxResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn sql_context(self, context: &str) -> Result<T> {
        self.map_err(|e| {
            BackendError::SqlxError {
                reason: format!("{context}: {e}"),
                source: Some(e),
            }
            .into()
        })
    }
}

/// SQLite-based backend implementing `Backend` using sqlx.
///
/// # Thread Safety
///
/// `SqliteBackend` is `Send + Sync` as required by `Backend`. The underlying
/// sqlx pool handles connection pooling and thread safety.
#[derive(Debug)]
pub struct SqliteBackend {
    pool: SqlitePool,
    /// Collections whose table is known to exist.
    tables: RwLock<HashSet<String>>,
}

impl SqliteBackend {
    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Open a SQLite database at the given path.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use userstore::backend::database::SqliteBackend;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let backend = SqliteBackend::open("users.db").await.unwrap();
    /// }
    /// ```
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        // mode=rwc: read-write-create (create file if it doesn't exist)
        let url = format!("sqlite:{}?mode=rwc", path.as_ref().display());
        Self::connect(&url).await
    }

    /// Connect to a SQLite database using a connection URL (e.g. `sqlite:./users.db`).
    pub async fn connect(url: &str) -> Result<Self> {
        // - journal_mode=WAL: Write-Ahead Logging for better concurrency
        // - synchronous=NORMAL: Balanced durability (safe with WAL)
        // - busy_timeout=5s: Wait for locks before failing
        let options = SqliteConnectOptions::from_str(url)
            .sql_context("Invalid SQLite URL")?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .sql_context("Failed to connect to SQLite")?;

        Self::with_pool(pool).await
    }

    /// Create an in-memory SQLite database.
    ///
    /// The database exists only for the lifetime of this backend instance.
    /// Useful for testing.
    pub async fn in_memory() -> Result<Self> {
        // An in-memory database lives as long as its connection, so the pool holds
        // exactly one connection and never recycles it.
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .sql_context("Invalid SQLite URL")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .sql_context("Failed to open in-memory SQLite")?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        let backend = Self {
            pool,
            tables: RwLock::new(HashSet::new()),
        };
        schema::initialize(&backend).await?;
        Ok(backend)
    }

    /// Names of the indices SQLite holds for `collection`.
    pub async fn index_names(&self, collection: &str) -> Result<Vec<String>> {
        let prefix = format!("{collection}.");
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = ? ORDER BY name",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await
        .sql_context("Failed to list indices")?;

        Ok(rows
            .into_iter()
            .filter_map(|(name,)| name.strip_prefix(&prefix).map(str::to_string))
            .collect())
    }

    /// Quoted table name for `collection`, creating the table on first use.
    async fn table(&self, collection: &str) -> Result<String> {
        let table = schema::quote_ident(collection)?;
        if self.tables.read().await.contains(collection) {
            return Ok(table);
        }

        sqlx::query(&schema::create_collection_sql(&table))
            .execute(&self.pool)
            .await
            .sql_context(&format!("Failed to create collection {collection}"))?;
        self.tables.write().await.insert(collection.to_string());
        Ok(table)
    }
}

#[async_trait]
impl Backend for SqliteBackend {
    async fn create_collection(&self, collection: &str) -> Result<()> {
        self.table(collection).await.map(|_| ())
    }

    async fn create_index(&self, collection: &str, index: &IndexSpec) -> Result<()> {
        storage::create_index(self, collection, index).await
    }

    async fn find_one(&self, collection: &str, filter: &Document) -> Result<Option<Document>> {
        storage::find_one(self, collection, filter).await
    }

    async fn insert(&self, collection: &str, document: Document) -> Result<Document> {
        storage::insert(self, collection, document).await
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Document,
        update: &UpdateOp,
        return_document: bool,
    ) -> Result<UpdateOutcome> {
        storage::update_one(self, collection, filter, update, return_document).await
    }

    async fn delete_many(&self, collection: &str, filter: &Document) -> Result<u64> {
        storage::delete_many(self, collection, filter).await
    }

    async fn count(&self, collection: &str, filter: &Document) -> Result<u64> {
        storage::count(self, collection, filter).await
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
