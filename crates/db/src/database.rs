//! Health-gated access to the document store.
//!
//! Every operation first checks the [`HealthManager`]: while the database is
//! down it fails fast with [`DbError::Degraded`] instead of touching the
//! store. An operation that finds the store unreachable reports the outage,
//! which starts the reconnect loop.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::health::HealthManager;
use crate::store::{DocumentStore, StoreError, StoreResult};
use crate::Document;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database unavailable, reconnecting in {retry_in_secs} seconds")]
    Degraded { retry_in_secs: u64 },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("malformed {entity} document {id}: {reason}")]
    Decode {
        entity: &'static str,
        id: String,
        reason: String,
    },
}

pub type DbResult<T> = Result<T, DbError>;

#[derive(Clone)]
pub struct Database {
    store: Arc<dyn DocumentStore>,
    health: Arc<HealthManager>,
}

impl Database {
    pub fn new(store: Arc<dyn DocumentStore>, reconnect_interval: Duration) -> Self {
        let health = Arc::new(HealthManager::new(Arc::clone(&store), reconnect_interval));
        Self { store, health }
    }

    pub fn health(&self) -> &Arc<HealthManager> {
        &self.health
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    /// Fail fast while the database is known to be down.
    pub fn ensure_healthy(&self) -> DbResult<()> {
        if self.health.is_healthy() {
            Ok(())
        } else {
            Err(DbError::Degraded {
                retry_in_secs: self.health.retry_in_secs(),
            })
        }
    }

    async fn run<T>(&self, op: impl Future<Output = StoreResult<T>>) -> DbResult<T> {
        self.ensure_healthy()?;
        let result = op.await;
        if let Err(StoreError::Unavailable(reason)) = &result {
            tracing::error!(error = %reason, "Document store operation failed");
            self.health.report_state(false);
        }
        Ok(result?)
    }

    pub async fn get(&self, collection: &str, id: &str) -> DbResult<Option<Document>> {
        self.run(self.store.get(collection, id)).await
    }

    pub async fn set(&self, collection: &str, id: &str, document: Document) -> DbResult<()> {
        self.run(self.store.set(collection, id, document)).await
    }

    pub async fn set_with_server_timestamp(
        &self,
        collection: &str,
        id: &str,
        document: Document,
        field: &str,
    ) -> DbResult<()> {
        self.run(
            self.store
                .set_with_server_timestamp(collection, id, document, field),
        )
        .await
    }

    pub async fn delete(&self, collection: &str, id: &str) -> DbResult<bool> {
        self.run(self.store.delete(collection, id)).await
    }

    pub async fn list_all(&self, collection: &str) -> DbResult<Vec<(String, Document)>> {
        self.run(self.store.list_all(collection)).await
    }

    pub async fn delete_all(&self, collection: &str) -> DbResult<u64> {
        self.run(self.store.delete_all(collection)).await
    }

    pub async fn exists(&self, collection: &str, id: &str) -> DbResult<bool> {
        self.run(self.store.exists(collection, id)).await
    }

    pub async fn count(&self, collection: &str) -> DbResult<u64> {
        self.run(self.store.count(collection)).await
    }

    pub async fn increment(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        by: i64,
    ) -> DbResult<i64> {
        self.run(self.store.increment(collection, id, field, by)).await
    }

    pub async fn health_check(&self) -> DbResult<()> {
        self.run(self.store.health_check()).await
    }
}
