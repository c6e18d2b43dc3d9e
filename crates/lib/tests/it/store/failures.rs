//! Store and hasher failures surface as errors, never as "no match".

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::json;
use userstore::backend::{Backend, BackendError, IndexSpec, UpdateOp, UpdateOutcome};
use userstore::hash::{HashError, HashProvider};
use userstore::{Document, MembershipOp, Schema, StoreOptions, UserStore};

use crate::helpers::*;

/// A backend that is reachable at setup time and unavailable afterwards.
#[derive(Debug, Default)]
struct FailingBackend {
    fail_setup: bool,
    setup_calls: AtomicUsize,
}

impl FailingBackend {
    fn unavailable<T>() -> userstore::Result<T> {
        Err(BackendError::Unavailable {
            reason: "connection refused".to_string(),
        }
        .into())
    }

    fn setup(&self) -> userstore::Result<()> {
        self.setup_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_setup {
            return Self::unavailable();
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for FailingBackend {
    async fn create_collection(&self, _collection: &str) -> userstore::Result<()> {
        self.setup()
    }

    async fn create_index(&self, _collection: &str, _index: &IndexSpec) -> userstore::Result<()> {
        self.setup()
    }

    async fn find_one(
        &self,
        _collection: &str,
        _filter: &Document,
    ) -> userstore::Result<Option<Document>> {
        Self::unavailable()
    }

    async fn insert(&self, _collection: &str, _document: Document) -> userstore::Result<Document> {
        Self::unavailable()
    }

    async fn update_one(
        &self,
        _collection: &str,
        _filter: &Document,
        _update: &UpdateOp,
        _return_document: bool,
    ) -> userstore::Result<UpdateOutcome> {
        Self::unavailable()
    }

    async fn delete_many(&self, _collection: &str, _filter: &Document) -> userstore::Result<u64> {
        Self::unavailable()
    }

    async fn count(&self, _collection: &str, _filter: &Document) -> userstore::Result<u64> {
        Self::unavailable()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A hash provider whose every call fails.
#[derive(Debug)]
struct BrokenHasher;

#[async_trait]
impl HashProvider for BrokenHasher {
    async fn hash(&self, _plaintext: &str) -> userstore::Result<String> {
        Err(HashError::Failed {
            reason: "entropy source unavailable".to_string(),
        }
        .into())
    }

    async fn verify(&self, _plaintext: &str, _record: &str) -> userstore::Result<bool> {
        Err(HashError::Failed {
            reason: "entropy source unavailable".to_string(),
        }
        .into())
    }
}

async fn failing_store(schema: &Schema) -> UserStore {
    UserStore::open(Arc::new(FailingBackend::default()), schema, fast_options())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_backend_errors_propagate_from_every_operation() {
    let schema = password_schema();
    let store = failing_store(&schema).await;
    let plain = doc(json!({"FirstName": "Fake"}));
    let guarded = doc(json!({"FirstName": "Fake", "Password": "secret"}));
    let user = || doc(json!({"FirstName": "Fake", "Email": "a@email.com"}));

    let results = vec![
        store.add(user()).await.map(|_| ()),
        store.add_many(vec![user()]).await.map(|_| ()),
        store.get(&plain).await.map(|_| ()),
        store.get(&guarded).await.map(|_| ()),
        store.remove(&plain).await.map(|_| ()),
        store.remove(&guarded).await.map(|_| ()),
        store.count(&plain).await.map(|_| ()),
        store.update(&plain, doc(json!({"LastName": "X"}))).await.map(|_| ()),
        store.update(&guarded, doc(json!({"LastName": "X"}))).await.map(|_| ()),
        store
            .update_get(&plain, doc(json!({"LastName": "X"})))
            .await
            .map(|_| ()),
        store
            .update_atomic(&plain, doc(json!({})), MembershipOp::add(["A"]))
            .await
            .map(|_| ()),
        store
            .update_get_atomic(&plain, doc(json!({})), MembershipOp::remove(["A"]))
            .await
            .map(|_| ()),
        store.add_membership(&plain, ["A"]).await.map(|_| ()),
        store.remove_membership(&guarded, ["A"]).await.map(|_| ()),
    ];

    for (i, result) in results.into_iter().enumerate() {
        let err = result.expect_err(&format!("operation {i} should fail"));
        assert!(err.is_operational(), "operation {i}: unexpected error {err}");
        assert!(!err.is_constraint_violation());
    }
}

#[tokio::test]
async fn test_constraint_check_runs_before_the_store() {
    let store = failing_store(&constrained_schema()).await;
    let err = store.add(doc(json!({"FirstName": "Fake"}))).await.unwrap_err();
    assert!(err.is_not_null_violation());
}

#[tokio::test]
async fn test_failed_setup_fails_open() {
    let backend = Arc::new(FailingBackend {
        fail_setup: true,
        ..Default::default()
    });
    let err = UserStore::open(backend.clone(), &Schema::new(), StoreOptions::new())
        .await
        .unwrap_err();
    assert!(err.is_operational());

    // Index creation is never attempted once the collection failed
    UserStore::open(
        backend.clone(),
        &constrained_schema(),
        StoreOptions::new(),
    )
    .await
    .unwrap_err();
    assert_eq!(backend.setup_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_hasher_errors_propagate() {
    let backend = test_backend().await;
    let seeded = UserStore::open(backend.clone(), &password_schema(), fast_options())
        .await
        .unwrap();
    seeded
        .add(doc(json!({"FirstName": "Fake", "Email": "a@email.com", "Password": "secret"})))
        .await
        .unwrap();

    let broken = UserStore::open(
        backend,
        &password_schema(),
        fast_options().with_hasher(Arc::new(BrokenHasher)),
    )
    .await
    .unwrap();

    let err = broken
        .add(doc(json!({"FirstName": "Other", "Email": "b@email.com", "Password": "x"})))
        .await
        .unwrap_err();
    assert_eq!(err.module(), "hash");

    let err = broken
        .get(&doc(json!({"FirstName": "Fake", "Password": "secret"})))
        .await
        .unwrap_err();
    assert!(err.is_operational());

    let err = broken
        .remove(&doc(json!({"FirstName": "Fake", "Password": "secret"})))
        .await
        .unwrap_err();
    assert!(err.is_operational());
    assert_eq!(seeded.count(&doc(json!({}))).await.unwrap(), 1);
}

#[tokio::test]
async fn test_malformed_record_is_an_error() {
    let backend = test_backend().await;
    let plain = UserStore::open(backend.clone(), &Schema::new(), fast_options())
        .await
        .unwrap();
    plain
        .add(doc(json!({"FirstName": "Fake", "Password": "short"})))
        .await
        .unwrap();

    let guarded = UserStore::open(backend, &password_schema(), fast_options())
        .await
        .unwrap();
    let err = guarded
        .get(&doc(json!({"FirstName": "Fake", "Password": "short"})))
        .await
        .unwrap_err();
    assert_eq!(err.module(), "hash");
}
