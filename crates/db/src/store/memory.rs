//! In-memory document store.
//!
//! Used for local development and tests. Availability can be toggled with
//! [`MemoryStore::set_available`] to simulate an unreachable database; while
//! unavailable every operation fails with [`StoreError::Unavailable`].

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{DocumentStore, StoreError, StoreResult};
use crate::Document;

type Collection = BTreeMap<String, Document>;

#[derive(Debug)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
    available: AtomicBool,
    operations: AtomicU64,
    reconnects: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
            operations: AtomicU64::new(0),
            reconnects: AtomicU64::new(0),
        }
    }

    /// Simulate the backend going down (`false`) or coming back (`true`).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of data operations attempted, including failed ones.
    pub fn operations(&self) -> u64 {
        self.operations.load(Ordering::SeqCst)
    }

    /// Number of reconnect attempts.
    pub fn reconnects(&self) -> u64 {
        self.reconnects.load(Ordering::SeqCst)
    }

    fn check(&self) -> StoreResult<()> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("in-memory store switched off".into()))
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        self.check()?;
        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|c| c.get(id)).cloned())
    }

    async fn set(&self, collection: &str, id: &str, document: Document) -> StoreResult<()> {
        self.check()?;
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), document);
        Ok(())
    }

    async fn set_with_server_timestamp(
        &self,
        collection: &str,
        id: &str,
        mut document: Document,
        field: &str,
    ) -> StoreResult<()> {
        document.insert(field.to_string(), Utc::now().to_rfc3339().into());
        self.set(collection, id, document).await
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        self.check()?;
        let mut collections = self.collections.write().await;
        Ok(collections
            .get_mut(collection)
            .and_then(|c| c.remove(id))
            .is_some())
    }

    async fn list_all(&self, collection: &str) -> StoreResult<Vec<(String, Document)>> {
        self.check()?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|c| c.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default())
    }

    async fn delete_all(&self, collection: &str) -> StoreResult<u64> {
        self.check()?;
        let mut collections = self.collections.write().await;
        Ok(collections
            .remove(collection)
            .map(|c| c.len() as u64)
            .unwrap_or(0))
    }

    async fn exists(&self, collection: &str, id: &str) -> StoreResult<bool> {
        self.check()?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .is_some_and(|c| c.contains_key(id)))
    }

    async fn count(&self, collection: &str) -> StoreResult<u64> {
        self.check()?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|c| c.len() as u64)
            .unwrap_or(0))
    }

    async fn increment(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        by: i64,
    ) -> StoreResult<i64> {
        self.check()?;
        let mut collections = self.collections.write().await;
        let document = collections
            .get_mut(collection)
            .and_then(|c| c.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

        let current = match document.get(field) {
            None => 0,
            Some(value) => value.as_i64().ok_or_else(|| {
                StoreError::Malformed(format!("{collection}/{id}: field {field} is not an integer"))
            })?,
        };
        let next = current + by;
        document.insert(field.to_string(), next.into());
        Ok(next)
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.check()
    }

    async fn reconnect(&self) -> StoreResult<()> {
        self.reconnects.fetch_add(1, Ordering::SeqCst);
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("in-memory store switched off".into()))
        }
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn doc(value: serde_json::Value) -> Document {
        match value {
            serde_json::Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[tokio::test]
    async fn set_get_delete() {
        let store = MemoryStore::new();
        store.set("c", "a", doc(json!({"x": 1}))).await.unwrap();

        assert_eq!(store.get("c", "a").await.unwrap(), Some(doc(json!({"x": 1}))));
        assert!(store.exists("c", "a").await.unwrap());
        assert!(store.delete("c", "a").await.unwrap());
        assert!(!store.delete("c", "a").await.unwrap());
        assert_eq!(store.get("c", "a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn list_all_is_ordered_by_id() {
        let store = MemoryStore::new();
        for id in ["b", "c", "a"] {
            store.set("c", id, Document::new()).await.unwrap();
        }
        let ids: Vec<String> = store
            .list_all("c")
            .await
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(store.count("c").await.unwrap(), 3);
        assert_eq!(store.delete_all("c").await.unwrap(), 3);
        assert_eq!(store.count("c").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn increment_treats_missing_field_as_zero() {
        let store = MemoryStore::new();
        store.set("c", "a", Document::new()).await.unwrap();

        assert_eq!(store.increment("c", "a", "n", 1).await.unwrap(), 1);
        assert_eq!(store.increment("c", "a", "n", 2).await.unwrap(), 3);
        assert_matches!(
            store.increment("c", "missing", "n", 1).await,
            Err(StoreError::NotFound { .. })
        );
    }

    #[tokio::test]
    async fn server_timestamp_is_written() {
        let store = MemoryStore::new();
        store
            .set_with_server_timestamp("c", "a", Document::new(), "time")
            .await
            .unwrap();
        let stored = store.get("c", "a").await.unwrap().unwrap();
        let time = stored["time"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(time).is_ok());
    }

    #[tokio::test]
    async fn unavailable_store_rejects_operations() {
        let store = MemoryStore::new();
        store.set_available(false);

        assert_matches!(store.get("c", "a").await, Err(StoreError::Unavailable(_)));
        assert_matches!(store.reconnect().await, Err(StoreError::Unavailable(_)));
        assert_eq!(store.operations(), 1);
        assert_eq!(store.reconnects(), 1);

        store.set_available(true);
        assert!(store.reconnect().await.is_ok());
        assert!(store.health_check().await.is_ok());
    }
}
