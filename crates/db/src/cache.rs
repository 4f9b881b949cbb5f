//! Response cache for data endpoints.
//!
//! Entries are keyed by the hashed request key (see
//! [`renewables_core::cache_key`]) and hold the serialized response body
//! together with the countries and year range the response covered, so a
//! cache hit can still drive webhook invocation. Entries older than the
//! configured maximum age are treated as absent and evicted in the
//! background.

use std::time::Duration;

use chrono::Utc;
use renewables_core::cache_key;
use renewables_core::constants::CACHE_COLLECTION;
use renewables_core::renewables::YearRange;
use renewables_core::tasks::BackgroundTasks;
use renewables_core::types::{IsoCode, Timestamp, Year};
use serde::{Deserialize, Serialize};

use crate::database::{Database, DbError, DbResult};
use crate::Document;

const TIME_FIELD: &str = "time";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheDocument {
    response_body: String,
    iso_codes: Vec<IsoCode>,
    begin: Year,
    end: Year,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    time: Option<Timestamp>,
}

/// A cache hit.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    /// Serialized JSON body, replayed verbatim.
    pub body: String,
    /// Countries the response covered. Empty means all countries.
    pub iso_codes: Vec<IsoCode>,
    pub range: YearRange,
    pub stored_at: Timestamp,
}

#[derive(Clone)]
pub struct ResponseCache {
    db: Database,
    tasks: BackgroundTasks,
    max_age: Duration,
}

impl ResponseCache {
    pub fn new(db: Database, tasks: BackgroundTasks, max_age: Duration) -> Self {
        Self { db, tasks, max_age }
    }

    /// Look up the cached response for a request.
    pub async fn lookup(&self, path: &str, query: Option<&str>) -> DbResult<Option<CachedResponse>> {
        self.lookup_at(path, query, Utc::now()).await
    }

    /// Like [`lookup`](Self::lookup), judging staleness against `now`.
    pub async fn lookup_at(
        &self,
        path: &str,
        query: Option<&str>,
        now: Timestamp,
    ) -> DbResult<Option<CachedResponse>> {
        let key = cache_key::document_id(path, query);
        let Some(document) = self.db.get(CACHE_COLLECTION, &key).await? else {
            return Ok(None);
        };

        let entry: CacheDocument = serde_json::from_value(document.into()).map_err(|e| {
            DbError::Decode {
                entity: "cache",
                id: key.clone(),
                reason: e.to_string(),
            }
        })?;

        let stored_at = match entry.time {
            Some(stored_at) if self.is_fresh(stored_at, now) => stored_at,
            _ => {
                tracing::debug!(key = %cache_key::normalize(path, query), "Evicting stale cache entry");
                self.evict(key);
                return Ok(None);
            }
        };

        let range = YearRange {
            begin: entry.begin,
            end: entry.end,
        };
        Ok(Some(CachedResponse {
            body: entry.response_body,
            iso_codes: entry.iso_codes,
            range,
            stored_at,
        }))
    }

    /// Store a response, stamped with the store's current time.
    pub async fn store(
        &self,
        path: &str,
        query: Option<&str>,
        body: String,
        iso_codes: Vec<IsoCode>,
        range: YearRange,
    ) -> DbResult<()> {
        let key = cache_key::document_id(path, query);
        let entry = CacheDocument {
            response_body: body,
            iso_codes,
            begin: range.begin,
            end: range.end,
            time: None,
        };
        let document = match serde_json::to_value(entry) {
            Ok(serde_json::Value::Object(map)) => map,
            Ok(_) => Document::new(),
            Err(e) => {
                return Err(DbError::Decode {
                    entity: "cache",
                    id: key,
                    reason: e.to_string(),
                })
            }
        };

        self.db
            .set_with_server_timestamp(CACHE_COLLECTION, &key, document, TIME_FIELD)
            .await
    }

    /// [`store`](Self::store) in the background; failures are logged.
    pub fn store_detached(
        &self,
        path: String,
        query: Option<String>,
        body: String,
        iso_codes: Vec<IsoCode>,
        range: YearRange,
    ) {
        let cache = self.clone();
        self.tasks.spawn("cache_store", async move {
            if let Err(e) = cache
                .store(&path, query.as_deref(), body, iso_codes, range)
                .await
            {
                tracing::warn!(path = %path, error = %e, "Failed to cache response");
            }
        });
    }

    /// Drop every cached response.
    pub async fn clear(&self) -> DbResult<u64> {
        let removed = self.db.delete_all(CACHE_COLLECTION).await?;
        tracing::info!(removed, "Response cache cleared");
        Ok(removed)
    }

    fn is_fresh(&self, stored_at: Timestamp, now: Timestamp) -> bool {
        // A timestamp ahead of `now` (clock skew) counts as fresh.
        (now - stored_at)
            .to_std()
            .map_or(true, |age| age <= self.max_age)
    }

    fn evict(&self, key: String) {
        let db = self.db.clone();
        self.tasks.spawn("cache_evict", async move {
            if let Err(e) = db.delete(CACHE_COLLECTION, &key).await {
                tracing::warn!(key = %key, error = %e, "Failed to evict stale cache entry");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::{DocumentStore, MemoryStore};

    const PATH: &str = "/energy/v1/renewables/current/NOR";

    fn cache() -> (Arc<MemoryStore>, BackgroundTasks, ResponseCache) {
        let store = Arc::new(MemoryStore::new());
        let db = Database::new(store.clone(), Duration::from_secs(60));
        let tasks = BackgroundTasks::default();
        let cache = ResponseCache::new(db, tasks.clone(), Duration::from_secs(4 * 60 * 60));
        (store, tasks, cache)
    }

    #[tokio::test]
    async fn miss_then_hit() {
        let (_, _, cache) = cache();
        assert_eq!(cache.lookup(PATH, None).await.unwrap(), None);

        cache
            .store(PATH, None, "[1]".into(), vec!["NOR".into()], YearRange::current())
            .await
            .unwrap();

        let hit = cache.lookup(&format!("{PATH}/"), None).await.unwrap().unwrap();
        assert_eq!(hit.body, "[1]");
        assert_eq!(hit.iso_codes, vec!["NOR".to_string()]);
        assert_eq!(hit.range, YearRange::current());
    }

    #[tokio::test]
    async fn query_order_does_not_matter() {
        let (_, _, cache) = cache();
        cache
            .store(PATH, Some("a=1&b=2"), "[]".into(), vec![], YearRange::current())
            .await
            .unwrap();
        assert!(cache.lookup(PATH, Some("b=2&a=1")).await.unwrap().is_some());
        assert!(cache.lookup(PATH, Some("a=1")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn stale_entry_is_a_miss_and_gets_evicted() {
        let (store, tasks, cache) = cache();
        cache
            .store(PATH, None, "[]".into(), vec![], YearRange::current())
            .await
            .unwrap();
        assert_eq!(store.count(CACHE_COLLECTION).await.unwrap(), 1);

        let later = Utc::now() + chrono::Duration::hours(4) + chrono::Duration::seconds(1);
        assert_eq!(cache.lookup_at(PATH, None, later).await.unwrap(), None);

        assert!(tasks.shutdown(Duration::from_secs(1)).await);
        assert_eq!(store.count(CACHE_COLLECTION).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn entry_within_max_age_is_served() {
        let (_, _, cache) = cache();
        cache
            .store(PATH, None, "[]".into(), vec![], YearRange::current())
            .await
            .unwrap();
        let later = Utc::now() + chrono::Duration::hours(3);
        assert!(cache.lookup_at(PATH, None, later).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn detached_store_and_clear() {
        let (store, tasks, cache) = cache();
        cache.store_detached(PATH.into(), None, "[]".into(), vec![], YearRange::current());
        assert!(tasks.shutdown(Duration::from_secs(1)).await);
        assert_eq!(store.count(CACHE_COLLECTION).await.unwrap(), 1);

        assert_eq!(cache.clear().await.unwrap(), 1);
        assert_eq!(store.count(CACHE_COLLECTION).await.unwrap(), 0);
    }
}
