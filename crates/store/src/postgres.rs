use async_trait::async_trait;
use common::Version;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{Document, Result, StoreError, store::DocumentStore};

/// PostgreSQL-backed document store.
///
/// Documents live in a single `documents` table keyed by
/// `(collection, id)`, with the JSON body in a `jsonb` column and the
/// version in the `WHERE` clause of every conditional update.
#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    /// Creates a new PostgreSQL document store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_document(row: PgRow) -> Result<Document> {
        Ok(Document {
            collection: row.try_get("collection")?,
            id: row.try_get("id")?,
            version: Version::new(row.try_get("version")?),
            payload: row.try_get("payload")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn put_new(
        &self,
        collection: &str,
        id: &str,
        payload: serde_json::Value,
    ) -> Result<Version> {
        let inserted: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO documents (collection, id, version, payload, updated_at)
            VALUES ($1, $2, 1, $3, now())
            ON CONFLICT (collection, id) DO NOTHING
            RETURNING version
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(&payload)
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some(version) => Ok(Version::new(version)),
            None => Err(StoreError::AlreadyExists {
                collection: collection.to_string(),
                id: id.to_string(),
            }),
        }
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let row = sqlx::query(
            r#"
            SELECT collection, id, version, payload, updated_at
            FROM documents
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_document).transpose()
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        expected: Version,
        payload: serde_json::Value,
    ) -> Result<Version> {
        let updated: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE documents
            SET payload = $4, version = version + 1, updated_at = now()
            WHERE collection = $1 AND id = $2 AND version = $3
            RETURNING version
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(expected.as_i64())
        .bind(&payload)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(version) = updated {
            return Ok(Version::new(version));
        }

        // No row matched: distinguish a missing document from a lost race.
        let actual: Option<i64> = sqlx::query_scalar(
            "SELECT version FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match actual {
            Some(actual) => Err(StoreError::ConcurrencyConflict {
                collection: collection.to_string(),
                id: id.to_string(),
                expected,
                actual: Version::new(actual),
            }),
            None => Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            }),
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>> {
        let rows = sqlx::query(
            r#"
            SELECT collection, id, version, payload, updated_at
            FROM documents
            WHERE collection = $1
            "#,
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_document).collect()
    }
}
