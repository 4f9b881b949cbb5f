//! Postgres backend tests. Ignored by default; run with
//! `DATABASE_URL=postgres://... cargo test -p renewables-db -- --ignored`.

use renewables_db::store::{DocumentStore, PgDocumentStore, StoreError};
use renewables_db::Document;
use serde_json::json;

async fn pg_store() -> Option<PgDocumentStore> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("skipping postgres tests: DATABASE_URL not set");
        return None;
    };
    let store = PgDocumentStore::connect(&url)
        .await
        .expect("connect to postgres");
    Some(store)
}

fn doc(value: serde_json::Value) -> Document {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

#[tokio::test]
#[ignore]
async fn crud_round_trip() {
    let Some(store) = pg_store().await else { return };
    let collection = "test_crud";
    store.delete_all(collection).await.unwrap();

    store
        .set(collection, "b", doc(json!({"name": "B"})))
        .await
        .unwrap();
    store
        .set(collection, "a", doc(json!({"name": "A"})))
        .await
        .unwrap();

    assert_eq!(
        store.get(collection, "a").await.unwrap(),
        Some(doc(json!({"name": "A"})))
    );
    let ids: Vec<String> = store
        .list_all(collection)
        .await
        .unwrap()
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert_eq!(store.count(collection).await.unwrap(), 2);
    assert!(store.exists(collection, "b").await.unwrap());

    assert!(store.delete(collection, "a").await.unwrap());
    assert!(!store.delete(collection, "a").await.unwrap());
    assert_eq!(store.delete_all(collection).await.unwrap(), 1);
}

#[tokio::test]
#[ignore]
async fn increment_is_atomic() {
    let Some(store) = pg_store().await else { return };
    let store = std::sync::Arc::new(store);
    let collection = "test_increment";
    store.delete_all(collection).await.unwrap();
    store
        .set(collection, "hook", doc(json!({"invocations": 0})))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..20 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .increment(collection, "hook", "invocations", 1)
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let stored = store.get(collection, "hook").await.unwrap().unwrap();
    assert_eq!(stored["invocations"], 20);

    assert!(matches!(
        store.increment(collection, "missing", "invocations", 1).await,
        Err(StoreError::NotFound { .. })
    ));
}

#[tokio::test]
#[ignore]
async fn server_timestamp_and_reconnect() {
    let Some(store) = pg_store().await else { return };
    let collection = "test_timestamp";
    store
        .set_with_server_timestamp(collection, "k", doc(json!({"v": 1})), "time")
        .await
        .unwrap();
    let stored = store.get(collection, "k").await.unwrap().unwrap();
    let time: chrono::DateTime<chrono::Utc> =
        serde_json::from_value(stored["time"].clone()).unwrap();
    assert!((chrono::Utc::now() - time).num_seconds().abs() < 60);

    store.reconnect().await.unwrap();
    store.health_check().await.unwrap();
}
