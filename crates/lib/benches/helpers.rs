//! Shared helpers for benchmark tests

use std::sync::Arc;

use userstore::{
    Document, FieldDescriptor, Schema, StoreOptions, UserStore,
    backend::{Backend, database::InMemory},
};

/// Creates a test backend based on TEST_BACKEND env var.
///
/// Supported values:
/// - "inmemory" or unset: InMemory backend (default)
/// - "sqlite": SQLite in-memory backend (requires `sqlite` feature)
///
/// This mirrors the pattern used in integration tests for consistency.
async fn test_backend() -> Arc<dyn Backend> {
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

/// A user with a unique Email and a hashed Password.
pub fn user(i: usize) -> Document {
    let value = serde_json::json!({
        "Email": format!("user{i}@email.com"),
        "FirstName": format!("User{i}"),
        "Password": format!("password{i}"),
    });
    Document::try_from(value).expect("user is an object")
}

/// Creates a store holding `user_count` users, hashing with `iterations`.
///
/// Email is required and unique, Password is hashable.
pub async fn setup_store_async(user_count: usize, iterations: u32) -> UserStore {
    let schema = Schema::new()
        .field("Email", FieldDescriptor::new().required().unique())
        .field("Password", FieldDescriptor::new().hashable());
    let options = StoreOptions::new().with_iterations(iterations);
    let store = UserStore::open(test_backend().await, &schema, options)
        .await
        .expect("Benchmark setup failed");

    let users = (0..user_count).map(user).collect();
    store.add_many(users).await.expect("Failed to add users");
    store
}
