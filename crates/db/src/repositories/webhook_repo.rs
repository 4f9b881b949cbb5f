//! Repository for the `webhooks` collection.
//!
//! Documents look like
//! `{"url": "...", "country": "NOR", "calls": 3, "invocations": 0, "year": -1}`,
//! keyed by webhook ID. A `year` of `-1` means no year filter.

use renewables_core::constants::WEBHOOKS_COLLECTION;
use renewables_core::types::Year;
use renewables_core::webhook::{generate_webhook_id, Webhook};
use serde::{Deserialize, Serialize};

use crate::database::{Database, DbError, DbResult};
use crate::store::StoreError;
use crate::Document;

const INVOCATIONS_FIELD: &str = "invocations";
const NO_YEAR: Year = -1;

#[derive(Debug, Serialize, Deserialize)]
struct WebhookDocument {
    url: String,
    country: String,
    calls: i64,
    #[serde(default)]
    invocations: i64,
    #[serde(default = "no_year")]
    year: Year,
}

fn no_year() -> Year {
    NO_YEAR
}

impl WebhookDocument {
    fn into_webhook(self, webhook_id: String) -> Webhook {
        Webhook {
            webhook_id,
            url: self.url,
            country: self.country,
            calls: self.calls,
            invocations: self.invocations,
            year: (self.year > 0).then_some(self.year),
        }
    }
}

fn decode(webhook_id: &str, doc: Document) -> DbResult<Webhook> {
    serde_json::from_value::<WebhookDocument>(doc.into())
        .map(|d| d.into_webhook(webhook_id.to_string()))
        .map_err(|e| DbError::Decode {
            entity: "webhook",
            id: webhook_id.to_string(),
            reason: e.to_string(),
        })
}

pub struct WebhookRepo;

impl WebhookRepo {
    /// Register a webhook under a fresh random ID.
    pub async fn create(
        db: &Database,
        url: &str,
        country: &str,
        calls: i64,
        year: Option<Year>,
    ) -> DbResult<Webhook> {
        let mut webhook_id = generate_webhook_id();
        while db.exists(WEBHOOKS_COLLECTION, &webhook_id).await? {
            webhook_id = generate_webhook_id();
        }

        let document = WebhookDocument {
            url: url.to_string(),
            country: country.to_string(),
            calls,
            invocations: 0,
            year: year.unwrap_or(NO_YEAR),
        };
        let doc = match serde_json::to_value(&document) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => Document::new(),
        };
        db.set(WEBHOOKS_COLLECTION, &webhook_id, doc).await?;

        Ok(document.into_webhook(webhook_id))
    }

    pub async fn find_by_id(db: &Database, webhook_id: &str) -> DbResult<Option<Webhook>> {
        db.get(WEBHOOKS_COLLECTION, webhook_id)
            .await?
            .map(|doc| decode(webhook_id, doc))
            .transpose()
    }

    /// All webhooks ordered by ID. Documents that fail to decode are logged
    /// and skipped.
    pub async fn list(db: &Database) -> DbResult<Vec<Webhook>> {
        let webhooks = db
            .list_all(WEBHOOKS_COLLECTION)
            .await?
            .into_iter()
            .filter_map(|(id, doc)| match decode(&id, doc) {
                Ok(webhook) => Some(webhook),
                Err(e) => {
                    tracing::warn!(webhook_id = %id, error = %e, "Skipping undecodable webhook");
                    None
                }
            })
            .collect();
        Ok(webhooks)
    }

    /// Delete a webhook. Returns `false` when it did not exist.
    pub async fn delete(db: &Database, webhook_id: &str) -> DbResult<bool> {
        db.delete(WEBHOOKS_COLLECTION, webhook_id).await
    }

    pub async fn count(db: &Database) -> DbResult<u64> {
        db.count(WEBHOOKS_COLLECTION).await
    }

    /// Atomically bump the invocation counter and return the new count, or
    /// `None` when the webhook was deleted in the meantime.
    pub async fn increment_invocations(db: &Database, webhook_id: &str) -> DbResult<Option<i64>> {
        match db
            .increment(WEBHOOKS_COLLECTION, webhook_id, INVOCATIONS_FIELD, 1)
            .await
        {
            Ok(count) => Ok(Some(count)),
            Err(DbError::Store(StoreError::NotFound { .. })) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use renewables_core::webhook::{ANY_COUNTRY, WEBHOOK_ID_LENGTH};

    use super::*;
    use crate::store::{DocumentStore, MemoryStore};

    fn db() -> (Arc<MemoryStore>, Database) {
        let store = Arc::new(MemoryStore::new());
        let db = Database::new(store.clone(), Duration::from_secs(60));
        (store, db)
    }

    #[tokio::test]
    async fn create_and_find() {
        let (store, db) = db();
        let created = WebhookRepo::create(&db, "http://localhost/hook", "NOR", 3, None)
            .await
            .unwrap();
        assert_eq!(created.webhook_id.len(), WEBHOOK_ID_LENGTH);
        assert_eq!(created.invocations, 0);

        let stored = store
            .get(WEBHOOKS_COLLECTION, &created.webhook_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored["year"], -1);

        let found = WebhookRepo::find_by_id(&db, &created.webhook_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found, created);
        assert_eq!(found.year, None);
    }

    #[tokio::test]
    async fn year_filter_round_trips() {
        let (_, db) = db();
        let created = WebhookRepo::create(&db, "http://x", ANY_COUNTRY, 1, Some(2010))
            .await
            .unwrap();
        let found = WebhookRepo::find_by_id(&db, &created.webhook_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.year, Some(2010));
    }

    #[tokio::test]
    async fn list_is_ordered_by_id() {
        let (_, db) = db();
        for _ in 0..5 {
            WebhookRepo::create(&db, "http://x", ANY_COUNTRY, 1, None)
                .await
                .unwrap();
        }
        let ids: Vec<String> = WebhookRepo::list(&db)
            .await
            .unwrap()
            .into_iter()
            .map(|w| w.webhook_id)
            .collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
        assert_eq!(WebhookRepo::count(&db).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn list_skips_undecodable_documents() {
        let (store, db) = db();
        let serde_json::Value::Object(broken) = serde_json::json!({"url": 5}) else {
            unreachable!()
        };
        store
            .set(WEBHOOKS_COLLECTION, "AAAAAAAAAAAAAAAA", broken)
            .await
            .unwrap();
        let hook = WebhookRepo::create(&db, "http://x", ANY_COUNTRY, 1, None)
            .await
            .unwrap();

        let listed = WebhookRepo::list(&db).await.unwrap();
        assert_eq!(listed, vec![hook]);
        assert!(WebhookRepo::find_by_id(&db, "AAAAAAAAAAAAAAAA").await.is_err());
        assert_eq!(WebhookRepo::count(&db).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn increment_and_delete() {
        let (_, db) = db();
        let hook = WebhookRepo::create(&db, "http://x", ANY_COUNTRY, 2, None)
            .await
            .unwrap();

        assert_eq!(
            WebhookRepo::increment_invocations(&db, &hook.webhook_id)
                .await
                .unwrap(),
            Some(1)
        );
        assert!(WebhookRepo::delete(&db, &hook.webhook_id).await.unwrap());
        assert!(!WebhookRepo::delete(&db, &hook.webhook_id).await.unwrap());
        assert_eq!(
            WebhookRepo::increment_invocations(&db, &hook.webhook_id)
                .await
                .unwrap(),
            None
        );
    }
}
