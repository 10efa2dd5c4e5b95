use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::Row;
use tracing::debug;

use crate::db::DbPool;

use super::store::{assign_id, with_id, DocumentStore, Filter, Sort, StoreError, StoreResult};

/// Documents of one collection stored as JSON text in the `documents` table.
///
/// Filtering and sorting run in-process over the decoded bodies, in `seq`
/// (insertion) order, so both stores share one query semantics.
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
    collection: Arc<str>,
}

impl SqliteStore {
    pub fn new(pool: DbPool, collection: &str) -> Self {
        Self {
            pool,
            collection: Arc::from(collection),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    async fn load_all(&self) -> StoreResult<Vec<(String, Value)>> {
        let rows = sqlx::query("SELECT id, body FROM documents WHERE collection = ?1 ORDER BY seq")
            .bind(self.collection())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|row| {
                let id: String = row.get("id");
                let body: String = row.get("body");
                Ok((id, decode(&body)?))
            })
            .collect()
    }
}

fn decode(body: &str) -> StoreResult<Value> {
    let value: Value = serde_json::from_str(body)?;
    if !value.is_object() {
        return Err(StoreError::Corrupt(format!("expected object, got {value}")));
    }
    Ok(value)
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn insert(&self, record: Value) -> StoreResult<Value> {
        let (id, record) = assign_id(record)?;
        sqlx::query("INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3)")
            .bind(self.collection())
            .bind(&id)
            .bind(serde_json::to_string(&record)?)
            .execute(&self.pool)
            .await?;
        debug!(collection = self.collection(), %id, "document inserted");
        Ok(record)
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Value>> {
        let body: Option<String> =
            sqlx::query_scalar("SELECT body FROM documents WHERE collection = ?1 AND id = ?2")
                .bind(self.collection())
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        body.as_deref().map(decode).transpose()
    }

    async fn find_many(&self, filter: &Filter, sort: &Sort) -> StoreResult<Vec<Value>> {
        let mut found: Vec<Value> = self
            .load_all()
            .await?
            .into_iter()
            .map(|(_, doc)| doc)
            .filter(|doc| filter.matches(doc))
            .collect();
        sort.apply(&mut found);
        Ok(found)
    }

    async fn update_by_id(&self, id: &str, record: Value) -> StoreResult<Option<Value>> {
        let record = with_id(record, id)?;
        let result = sqlx::query("UPDATE documents SET body = ?1 WHERE collection = ?2 AND id = ?3")
            .bind(serde_json::to_string(&record)?)
            .bind(self.collection())
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(record))
    }

    async fn delete_many(&self, filter: &Filter) -> StoreResult<u64> {
        if filter.conditions().is_empty() {
            let result = sqlx::query("DELETE FROM documents WHERE collection = ?1")
                .bind(self.collection())
                .execute(&self.pool)
                .await?;
            return Ok(result.rows_affected());
        }

        let doomed: Vec<String> = self
            .load_all()
            .await?
            .into_iter()
            .filter(|(_, doc)| filter.matches(doc))
            .map(|(id, _)| id)
            .collect();

        let mut tx = self.pool.begin().await?;
        let mut deleted = 0;
        for id in &doomed {
            let result = sqlx::query("DELETE FROM documents WHERE collection = ?1 AND id = ?2")
                .bind(self.collection())
                .bind(id)
                .execute(&mut *tx)
                .await?;
            deleted += result.rows_affected();
        }
        tx.commit().await?;
        Ok(deleted)
    }
}
