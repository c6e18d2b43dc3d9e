//! Backend and store creation.

use std::path::PathBuf;
use std::sync::Arc;

use userstore::backend::{Backend, database::InMemory, database::SqliteBackend};
use userstore::{Schema, StoreOptions, UserStore};

use crate::cli::{Backend as BackendKind, BackendConfig, StoreConfig};

const SQLITE_FILE: &str = "userstore.db";
const JSON_FILE: &str = "userstore.json";

fn data_dir(config: &BackendConfig) -> PathBuf {
    config.data_dir.clone().unwrap_or_else(|| PathBuf::from("."))
}

/// Human-readable label of the configured backend.
pub fn backend_label(config: &BackendConfig) -> String {
    match config.backend {
        BackendKind::Sqlite => format!("sqlite ({})", data_dir(config).join(SQLITE_FILE).display()),
        BackendKind::Inmemory => format!("inmemory ({})", data_dir(config).join(JSON_FILE).display()),
    }
}

/// Create the appropriate backend based on configuration
pub async fn create_backend(
    config: &BackendConfig,
) -> Result<Arc<dyn Backend>, Box<dyn std::error::Error>> {
    let data_dir = data_dir(config);

    // Ensure data directory exists
    tokio::fs::create_dir_all(&data_dir).await?;

    match config.backend {
        BackendKind::Sqlite => {
            let db_path = data_dir.join(SQLITE_FILE);
            tracing::debug!("Using SQLite backend at {}", db_path.display());
            Ok(Arc::new(SqliteBackend::open(&db_path).await?))
        }
        BackendKind::Inmemory => {
            let json_path = data_dir.join(JSON_FILE);
            tracing::debug!(
                "Using in-memory backend with persistence at {}",
                json_path.display()
            );
            Ok(Arc::new(InMemory::load_from_file(&json_path).await?))
        }
    }
}

/// Writes an in-memory backend back to its JSON file. Other backends persist on their own.
pub async fn persist(
    backend: &Arc<dyn Backend>,
    config: &BackendConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(in_memory) = backend.as_any().downcast_ref::<InMemory>() {
        let json_path = data_dir(config).join(JSON_FILE);
        in_memory.save_to_file(&json_path).await?;
        tracing::debug!("Saved users to {}", json_path.display());
    }
    Ok(())
}

/// Store options from the command line.
pub fn store_options(config: &StoreConfig) -> StoreOptions {
    StoreOptions::new()
        .with_collection_name(config.collection.clone())
        .with_iterations(config.iterations)
        .with_key_length(config.key_length)
}

/// Reads the schema file, or an empty schema when none is configured.
pub async fn load_schema(config: &StoreConfig) -> Result<Schema, Box<dyn std::error::Error>> {
    match &config.schema {
        Some(path) => {
            let json = tokio::fs::read_to_string(path).await?;
            Ok(serde_json::from_str(&json)?)
        }
        None => Ok(Schema::new()),
    }
}

/// Opens the configured store.
pub async fn open_store(
    backend: Arc<dyn Backend>,
    config: &StoreConfig,
) -> Result<UserStore, Box<dyn std::error::Error>> {
    let schema = load_schema(config).await?;
    Ok(UserStore::open(backend, &schema, store_options(config)).await?)
}
