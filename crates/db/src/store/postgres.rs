//! Postgres-backed document store.
//!
//! All collections share the `documents` table; bodies are stored as JSONB.
//! The pool sits behind a lock so [`DocumentStore::reconnect`] can replace
//! it after the database went away.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tokio::sync::RwLock;

use super::{DocumentStore, StoreError, StoreResult};
use crate::{create_pool, run_migrations, Document};

pub struct PgDocumentStore {
    database_url: String,
    pool: RwLock<PgPool>,
}

impl PgDocumentStore {
    /// Connect and apply migrations.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = create_pool(database_url).await.map_err(map_sqlx)?;
        run_migrations(&pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("migrations failed: {e}")))?;

        Ok(Self {
            database_url: database_url.to_string(),
            pool: RwLock::new(pool),
        })
    }

    async fn pool(&self) -> PgPool {
        self.pool.read().await.clone()
    }
}

fn map_sqlx(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Decode(e) => StoreError::Malformed(e.to_string()),
        sqlx::Error::ColumnDecode { index, source } => {
            StoreError::Malformed(format!("column {index}: {source}"))
        }
        other => StoreError::Unavailable(other.to_string()),
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let row: Option<Json<Document>> = sqlx::query_scalar(
            "SELECT body FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool().await)
        .await
        .map_err(map_sqlx)?;
        Ok(row.map(|Json(body)| body))
    }

    async fn set(&self, collection: &str, id: &str, document: Document) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3) \
             ON CONFLICT (collection, id) \
             DO UPDATE SET body = EXCLUDED.body, updated_at = now()",
        )
        .bind(collection)
        .bind(id)
        .bind(Json(document))
        .execute(&self.pool().await)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn set_with_server_timestamp(
        &self,
        collection: &str,
        id: &str,
        document: Document,
        field: &str,
    ) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO documents (collection, id, body) \
             VALUES ($1, $2, jsonb_set($3, ARRAY[$4::text], to_jsonb(now()))) \
             ON CONFLICT (collection, id) \
             DO UPDATE SET body = EXCLUDED.body, updated_at = now()",
        )
        .bind(collection)
        .bind(id)
        .bind(Json(document))
        .bind(field)
        .execute(&self.pool().await)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool().await)
            .await
            .map_err(map_sqlx)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_all(&self, collection: &str) -> StoreResult<Vec<(String, Document)>> {
        let rows: Vec<(String, Json<Document>)> = sqlx::query_as(
            "SELECT id, body FROM documents WHERE collection = $1 ORDER BY id",
        )
        .bind(collection)
        .fetch_all(&self.pool().await)
        .await
        .map_err(map_sqlx)?;
        Ok(rows.into_iter().map(|(id, Json(body))| (id, body)).collect())
    }

    async fn delete_all(&self, collection: &str) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1")
            .bind(collection)
            .execute(&self.pool().await)
            .await
            .map_err(map_sqlx)?;
        Ok(result.rows_affected())
    }

    async fn exists(&self, collection: &str, id: &str) -> StoreResult<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM documents WHERE collection = $1 AND id = $2)",
        )
        .bind(collection)
        .bind(id)
        .fetch_one(&self.pool().await)
        .await
        .map_err(map_sqlx)
    }

    async fn count(&self, collection: &str) -> StoreResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection = $1")
            .bind(collection)
            .fetch_one(&self.pool().await)
            .await
            .map_err(map_sqlx)?;
        Ok(count.max(0) as u64)
    }

    async fn increment(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        by: i64,
    ) -> StoreResult<i64> {
        // Single statement so concurrent increments never lose updates.
        let value: Option<i64> = sqlx::query_scalar(
            "UPDATE documents \
             SET body = jsonb_set(body, ARRAY[$3::text], \
                        to_jsonb(COALESCE((body->>$3)::bigint, 0) + $4)), \
                 updated_at = now() \
             WHERE collection = $1 AND id = $2 \
             RETURNING (body->>$3)::bigint",
        )
        .bind(collection)
        .bind(id)
        .bind(field)
        .bind(by)
        .fetch_optional(&self.pool().await)
        .await
        .map_err(map_sqlx)?;

        value.ok_or_else(|| StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        })
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool().await)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn reconnect(&self) -> StoreResult<()> {
        let pool = create_pool(&self.database_url).await.map_err(map_sqlx)?;
        let old = std::mem::replace(&mut *self.pool.write().await, pool);
        old.close().await;
        tracing::info!("Postgres connection pool rebuilt");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
