use std::sync::Arc;

use serde_json::Value;
use userstore::backend::{Backend, IndexSpec, database::InMemory};
use userstore::{Document, FieldDescriptor, Schema, StoreOptions, UserStore};

/// Iterations used by stores in tests. Low enough to keep the suite fast.
pub const TEST_ITERATIONS: u32 = 10;

/// Creates a test backend based on the TEST_BACKEND env var.
///
/// Supported values:
/// - "inmemory" or unset: InMemory backend (default)
/// - "sqlite": SQLite in-memory backend (requires `sqlite` feature)
pub async fn test_backend() -> Arc<dyn Backend> {
    match std::env::var("TEST_BACKEND").as_deref() {
        Ok("sqlite") => {
            #[cfg(feature = "sqlite")]
            {
                use userstore::backend::database::SqliteBackend;
                Arc::new(
                    SqliteBackend::in_memory()
                        .await
                        .expect("Failed to create SQLite backend"),
                )
            }
            #[cfg(not(feature = "sqlite"))]
            {
                panic!("TEST_BACKEND=sqlite requires the 'sqlite' feature to be enabled")
            }
        }
        Ok("inmemory") | Ok("") | Err(_) => Arc::new(InMemory::new()),
        Ok(other) => {
            panic!("Unknown TEST_BACKEND value: {other}. Supported: inmemory, sqlite")
        }
    }
}

/// Builds a document from a `json!` object.
pub fn doc(value: Value) -> Document {
    Document::try_from(value).expect("test documents are objects")
}

/// Default options with a cheap hasher.
pub fn fast_options() -> StoreOptions {
    StoreOptions::new().with_iterations(TEST_ITERATIONS)
}

/// Options used by the constrained scenarios: a unique full-name index.
pub fn full_name_options() -> StoreOptions {
    fast_options().with_index(IndexSpec::unique(["FirstName", "LastName"]))
}

/// Email required and unique, FirstName required, Username unique.
pub fn constrained_schema() -> Schema {
    Schema::new()
        .field("Email", FieldDescriptor::new().required().unique())
        .field("FirstName", FieldDescriptor::new().required())
        .field("Username", FieldDescriptor::new().unique())
}

/// The constrained schema plus a hashed `Password`.
pub fn password_schema() -> Schema {
    constrained_schema().field("Password", FieldDescriptor::new().hashable())
}

/// Opens a store over a fresh test backend.
pub async fn open_store(schema: &Schema, options: StoreOptions) -> UserStore {
    UserStore::open(test_backend().await, schema, options)
        .await
        .expect("Failed to open store")
}

/// Memberships of `user` as plain strings.
pub fn memberships(user: &Document) -> Vec<&str> {
    user.get("Memberships")
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

/// True if every name in `expected` is among `user`'s memberships and nothing else is.
pub fn has_exactly_memberships(user: &Document, expected: &[&str]) -> bool {
    let actual = memberships(user);
    actual.len() == expected.len() && expected.iter().all(|m| actual.contains(m))
}
