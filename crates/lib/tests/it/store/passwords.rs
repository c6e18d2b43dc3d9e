//! Hashed fields: hashing on write, verification on every addressed operation.

use std::sync::Arc;

use serde_json::json;
use userstore::hash::{Argon2Hasher, HashProvider, Pbkdf2Hasher};
use userstore::{FieldDescriptor, UserStore};

use crate::helpers::*;

/// Walks a store through every operation with right and wrong passwords.
async fn exercise_password(store: &UserStore) {
    store
        .add(doc(json!({
            "FirstName": "Fake",
            "LastName": "FakeToo",
            "Email": "Fake@email.com",
            "Password": "FakeAgain"
        })))
        .await
        .unwrap();

    let empty = store
        .get(&doc(json!({"FirstName": "Fake", "LastName": "FakeToo", "Password": ""})))
        .await
        .unwrap();
    assert!(empty.is_none(), "an empty password must not match");

    let nobody = store
        .get(&doc(json!({
            "FirstName": "NonExistent",
            "LastName": "NonExistent",
            "Email": "NonExistent",
            "Password": "NonExistent"
        })))
        .await
        .unwrap();
    assert!(nobody.is_none());

    let wrong = |password: &str| {
        doc(json!({"FirstName": "Fake", "LastName": "FakeToo", "Password": password}))
    };

    assert_eq!(store.remove(&wrong("Wrong")).await.unwrap(), 0);
    assert_eq!(
        store
            .update(&wrong("WrongToo"), doc(json!({"SomeField": "Hello world!"})))
            .await
            .unwrap(),
        0
    );
    assert!(
        store
            .get(&doc(json!({"SomeField": "Hello world!"})))
            .await
            .unwrap()
            .is_none()
    );

    assert!(store.get(&wrong("FakeAgain")).await.unwrap().is_some());
    assert_eq!(
        store
            .update(&wrong("FakeAgain"), doc(json!({"Password": "FakeAgain2"})))
            .await
            .unwrap(),
        1
    );
    assert!(store.get(&wrong("FakeAgain")).await.unwrap().is_none());
    assert!(store.get(&wrong("FakeAgain2")).await.unwrap().is_some());

    assert_eq!(store.add_membership(&wrong("Wrong"), ["Banned"]).await.unwrap(), 0);
    assert_eq!(
        store
            .add_membership(&wrong("FakeAgain2"), ["Banned"])
            .await
            .unwrap(),
        1
    );
    assert_eq!(
        store
            .remove_membership(&wrong("Wrong"), ["Banned"])
            .await
            .unwrap(),
        0
    );
    assert_eq!(
        store
            .remove_membership(&wrong("FakeAgain2"), ["Banned"])
            .await
            .unwrap(),
        1
    );

    assert_eq!(store.remove(&wrong("FakeAgain2")).await.unwrap(), 1);
    assert_eq!(store.count(&doc(json!({}))).await.unwrap(), 0);
}

#[tokio::test]
async fn test_passwords() {
    let store = open_store(&password_schema(), full_name_options()).await;
    exercise_password(&store).await;
}

#[tokio::test]
async fn test_custom_hasher() {
    let hasher: Arc<dyn HashProvider> = Arc::new(Argon2Hasher::new());
    let store = open_store(&password_schema(), full_name_options().with_hasher(hasher)).await;
    exercise_password(&store).await;
}

#[tokio::test]
async fn test_stored_password_is_a_hash_record() {
    let store = open_store(&password_schema(), full_name_options()).await;
    let stored = store
        .add(doc(json!({"FirstName": "Fake", "Email": "a@email.com", "Password": "secret"})))
        .await
        .unwrap();

    let record = stored.get_str("Password").unwrap();
    assert_ne!(record, "secret");

    let hasher = Pbkdf2Hasher::new(20, TEST_ITERATIONS);
    assert!(hasher.verify("secret", record).await.unwrap());

    // Two users with the same password get different records
    let other = store
        .add(doc(json!({"FirstName": "Other", "Email": "b@email.com", "Password": "secret"})))
        .await
        .unwrap();
    assert_ne!(other.get_str("Password"), Some(record));
}

#[tokio::test]
async fn test_multiple_hashed_fields() {
    let schema = password_schema().field("EmailToken", FieldDescriptor::new().hashable());
    let store = open_store(&schema, full_name_options()).await;
    store
        .add(doc(json!({
            "FirstName": "Fake",
            "LastName": "FakeToo",
            "Email": "Fake@email.com",
            "Password": "FakeAgain",
            "EmailToken": "Token!"
        })))
        .await
        .unwrap();

    let filter = |first: &str, password: &str, token: &str| {
        doc(json!({
            "FirstName": first,
            "LastName": "FakeToo",
            "Password": password,
            "EmailToken": token
        }))
    };

    assert!(store.get(&filter("Fake", "Wrong", "Wrong")).await.unwrap().is_none());
    assert!(store.get(&filter("Fake", "FakeAgain", "Wrong")).await.unwrap().is_none());
    assert!(store.get(&filter("Fake", "FakeAgain", "Token!")).await.unwrap().is_some());

    let rename = || doc(json!({"FirstName": "Ni!"}));
    assert_eq!(store.update(&filter("Fake", "Wrong", "Wrong"), rename()).await.unwrap(), 0);
    assert_eq!(store.update(&filter("Fake", "Wrong", "Token!"), rename()).await.unwrap(), 0);
    assert_eq!(store.update(&filter("Fake", "FakeAgain", "Token!"), rename()).await.unwrap(), 1);

    assert_eq!(store.remove(&filter("Ni!", "Wrong", "Wrong")).await.unwrap(), 0);
    assert_eq!(store.remove(&filter("Ni!", "FakeAgain", "Wrong")).await.unwrap(), 0);

    store
        .update(
            &filter("Ni!", "FakeAgain", "Token!"),
            doc(json!({"Password": "FakeAgain2", "EmailToken": "Token!2"})),
        )
        .await
        .unwrap();
    assert_eq!(store.remove(&filter("Ni!", "FakeAgain2", "Token!2")).await.unwrap(), 1);
}

#[tokio::test]
async fn test_hash_only_restricts_hashing() {
    let schema = password_schema().field("EmailToken", FieldDescriptor::new().hashable());
    let store = open_store(&schema, fast_options().with_hash_only(["Password"])).await;

    let stored = store
        .add(doc(json!({
            "FirstName": "Fake",
            "Email": "Fake@email.com",
            "Password": "secret",
            "EmailToken": "Token!"
        })))
        .await
        .unwrap();
    assert_ne!(stored.get_str("Password"), Some("secret"));
    assert_eq!(stored.get_str("EmailToken"), Some("Token!"));

    // EmailToken is matched as a plain value
    let user = store
        .get(&doc(json!({"EmailToken": "Token!", "Password": "secret"})))
        .await
        .unwrap();
    assert!(user.is_some());
}

#[tokio::test]
async fn test_null_hashed_value_is_a_plain_filter() {
    let store = open_store(&password_schema(), fast_options()).await;
    store
        .add(doc(json!({"FirstName": "NoPassword", "Email": "a@email.com"})))
        .await
        .unwrap();

    let user = store
        .get(&doc(json!({"FirstName": "NoPassword", "Password": null})))
        .await
        .unwrap();
    assert!(user.is_some());
}

#[tokio::test]
async fn test_non_string_plaintext_is_rejected() {
    let store = open_store(&password_schema(), fast_options()).await;
    let err = store
        .add(doc(json!({"FirstName": "Fake", "Email": "a@email.com", "Password": 1234})))
        .await
        .unwrap_err();
    assert_eq!(err.module(), "hash");
    assert_eq!(store.count(&doc(json!({}))).await.unwrap(), 0);
}

#[tokio::test]
async fn test_non_string_password_filter_hides_existence() {
    let store = open_store(&password_schema(), fast_options()).await;
    store
        .add(doc(json!({"FirstName": "Fake", "Email": "a@email.com", "Password": "secret"})))
        .await
        .unwrap();

    for email in ["a@email.com", "nobody@email.com"] {
        let filter = doc(json!({"Email": email, "Password": 1234}));

        let err = store.get(&filter).await.unwrap_err();
        assert_eq!(err.module(), "hash", "get for {email}");
        let err = store
            .update(&filter, doc(json!({"LastName": "B"})))
            .await
            .unwrap_err();
        assert_eq!(err.module(), "hash", "update for {email}");
        let err = store
            .add_membership(&filter, ["Admin"])
            .await
            .unwrap_err();
        assert_eq!(err.module(), "hash", "add_membership for {email}");
        let err = store.remove(&filter).await.unwrap_err();
        assert_eq!(err.module(), "hash", "remove for {email}");
    }

    let user = store
        .get(&doc(json!({"Email": "a@email.com", "Password": "secret"})))
        .await
        .unwrap()
        .expect("user is untouched");
    assert!(user.get("LastName").is_none());
}

#[tokio::test]
async fn test_count_does_not_verify_hashes() {
    let store = open_store(&password_schema(), fast_options()).await;
    store
        .add(doc(json!({"FirstName": "Fake", "Email": "a@email.com", "Password": "secret"})))
        .await
        .unwrap();

    let count = store
        .count(&doc(json!({"FirstName": "Fake", "Password": "secret"})))
        .await
        .unwrap();
    assert_eq!(count, 0);
}
