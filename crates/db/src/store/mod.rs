//! Generic document store.
//!
//! Documents are JSON objects grouped in named collections and addressed by
//! a string ID. The renewables data, registered webhooks and cached responses
//! all live in their own collection.

use async_trait::async_trait;
use thiserror::Error;

use crate::Document;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// The backend could not be reached. Callers treat this as a signal that
    /// the database is down.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("malformed document: {0}")]
    Malformed(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document, or `None` when it does not exist.
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Create or replace a document.
    async fn set(&self, collection: &str, id: &str, document: Document) -> StoreResult<()>;

    /// Create or replace a document, setting `field` to the store's current
    /// time (RFC 3339).
    async fn set_with_server_timestamp(
        &self,
        collection: &str,
        id: &str,
        document: Document,
        field: &str,
    ) -> StoreResult<()>;

    /// Delete a document. Returns `false` when it did not exist.
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool>;

    /// All documents of a collection, ordered by ID.
    async fn list_all(&self, collection: &str) -> StoreResult<Vec<(String, Document)>>;

    /// Delete every document of a collection, returning how many were removed.
    async fn delete_all(&self, collection: &str) -> StoreResult<u64>;

    async fn exists(&self, collection: &str, id: &str) -> StoreResult<bool>;

    async fn count(&self, collection: &str) -> StoreResult<u64>;

    /// Atomically add `by` to the integer `field` of a document and return
    /// the new value. A missing field counts as zero.
    async fn increment(&self, collection: &str, id: &str, field: &str, by: i64)
        -> StoreResult<i64>;

    async fn health_check(&self) -> StoreResult<()>;

    /// Re-establish the backend connection.
    async fn reconnect(&self) -> StoreResult<()>;

    fn backend_name(&self) -> &'static str;
}
