//! SQLite backend tests.

use std::sync::Arc;

use serde_json::json;
use userstore::backend::database::SqliteBackend;
use userstore::backend::{Backend, IndexSpec};
use userstore::{Schema, UserStore};

use super::conformance;
use crate::helpers::{doc, fast_options, password_schema};

async fn backend() -> SqliteBackend {
    SqliteBackend::in_memory()
        .await
        .expect("Failed to create SQLite backend")
}

#[tokio::test]
async fn test_filters() {
    conformance::check_filters(&backend().await).await;
}

#[tokio::test]
async fn test_insert_and_find() {
    conformance::check_insert_and_find(&backend().await).await;
}

#[tokio::test]
async fn test_updates() {
    conformance::check_updates(&backend().await).await;
}

#[tokio::test]
async fn test_unique_indices() {
    conformance::check_unique_indices(&backend().await).await;
}

#[tokio::test]
async fn test_delete_many() {
    conformance::check_delete_many(&backend().await).await;
}

#[tokio::test]
async fn test_field_names() {
    conformance::check_field_names(&backend().await).await;
}

#[tokio::test]
async fn test_index_build_fails_on_existing_duplicates() {
    let backend = backend().await;
    backend.insert("Users", doc(json!({"Email": "a"}))).await.unwrap();
    backend.insert("Users", doc(json!({"Email": "a"}))).await.unwrap();

    let result = backend
        .create_index("Users", &IndexSpec::unique(["Email"]))
        .await;
    assert!(matches!(result, Err(userstore::Error::Backend(ref err)) if err.is_duplicate_key()));
    assert!(backend.index_names("Users").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_field_names_are_validated() {
    let backend = backend().await;
    let err = backend
        .count("Users", &doc(json!({"Bad\"Field": 1})))
        .await
        .unwrap_err();
    assert_eq!(err.module(), "backend");
}

#[tokio::test]
async fn test_password_guarded_update_with_apostrophe_field() {
    let backend = backend().await;
    let store = UserStore::open(Arc::new(backend), &password_schema(), fast_options())
        .await
        .unwrap();
    store
        .add(doc(json!({
            "FirstName": "Fake",
            "Email": "a@email.com",
            "Password": "secret",
            "Nick'name": "al"
        })))
        .await
        .unwrap();

    let filter = doc(json!({"Email": "a@email.com", "Password": "secret"}));
    let updated = store
        .update(&filter, doc(json!({"LastName": "B"})))
        .await
        .unwrap();
    assert_eq!(updated, 1);
    assert_eq!(store.add_membership(&filter, ["Admin"]).await.unwrap(), 1);

    let user = store.get(&filter).await.unwrap().unwrap();
    assert_eq!(user.get_str("LastName"), Some("B"));
    assert_eq!(user.get_str("Nick'name"), Some("al"));
    assert_eq!(store.remove(&filter).await.unwrap(), 1);
}

#[tokio::test]
async fn test_file_database_persists_users() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("users.db");

    {
        let backend = SqliteBackend::open(&path).await.unwrap();
        let store = UserStore::open(Arc::new(backend), &Schema::new(), fast_options())
            .await
            .unwrap();
        store.add(doc(json!({"FirstName": "Fake"}))).await.unwrap();
    }

    let backend = SqliteBackend::open(&path).await.unwrap();
    let store = UserStore::open(Arc::new(backend), &Schema::new(), fast_options())
        .await
        .unwrap();
    let user = store
        .get(&doc(json!({"FirstName": "Fake"})))
        .await
        .unwrap()
        .unwrap();
    assert!(user.id().is_some());
    assert!(user.contains_field("Memberships"));
}
