//! Runtime choice between the SQLite and in-memory record stores.

use supportify_core::store::{Filter, Order, Record, RecordStore};
use supportify_types::error::RepositoryError;

use crate::memory::InMemoryRecordStore;
use crate::sqlite::pool::DatabasePool;
use crate::sqlite::records::SqliteRecordStore;

/// The record store selected at startup.
pub enum StoreBackend {
    Sqlite(SqliteRecordStore),
    Memory(InMemoryRecordStore),
}

impl StoreBackend {
    /// Open (and migrate) the SQLite database at `database_url`.
    pub async fn sqlite(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = DatabasePool::new(database_url).await?;
        Ok(Self::Sqlite(SqliteRecordStore::new(pool)))
    }

    pub fn memory() -> Self {
        Self::Memory(InMemoryRecordStore::new())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "sqlite",
            Self::Memory(_) => "memory",
        }
    }

    /// Release database connections. No-op for the in-memory store.
    pub async fn close(&self) {
        if let Self::Sqlite(store) = self {
            store.pool().close().await;
        }
    }
}

impl RecordStore for StoreBackend {
    async fn insert_many(
        &self,
        collection: &str,
        records: Vec<Record>,
    ) -> Result<Vec<Record>, RepositoryError> {
        match self {
            Self::Sqlite(store) => store.insert_many(collection, records).await,
            Self::Memory(store) => store.insert_many(collection, records).await,
        }
    }

    async fn select(
        &self,
        collection: &str,
        filters: &[Filter],
        order: Option<&Order>,
    ) -> Result<Vec<Record>, RepositoryError> {
        match self {
            Self::Sqlite(store) => store.select(collection, filters, order).await,
            Self::Memory(store) => store.select(collection, filters, order).await,
        }
    }

    async fn update(
        &self,
        collection: &str,
        filters: &[Filter],
        patch: Record,
    ) -> Result<u64, RepositoryError> {
        match self {
            Self::Sqlite(store) => store.update(collection, filters, patch).await,
            Self::Memory(store) => store.update(collection, filters, patch).await,
        }
    }

    async fn delete(&self, collection: &str, filters: &[Filter]) -> Result<u64, RepositoryError> {
        match self {
            Self::Sqlite(store) => store.delete(collection, filters).await,
            Self::Memory(store) => store.delete(collection, filters).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_both_backends_answer_the_same_query() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("b.db").display());
        let backends = [StoreBackend::sqlite(&url).await.unwrap(), StoreBackend::memory()];

        for backend in &backends {
            let rows = vec![
                json!({"user_id": "u1", "created_at": "2025-01-01T10:00:02.000000Z"}),
                json!({"user_id": "u1", "created_at": "2025-01-01T10:00:01.000000Z"}),
            ]
            .into_iter()
            .filter_map(|v| v.as_object().cloned())
            .collect();
            backend.insert_many("chat_messages", rows).await.unwrap();

            let got = backend
                .select(
                    "chat_messages",
                    &[Filter::equals("user_id", "u1")],
                    Some(&Order::asc("created_at")),
                )
                .await
                .unwrap();
            assert_eq!(got.len(), 2, "{}", backend.kind());
            assert_eq!(got[0]["created_at"], "2025-01-01T10:00:01.000000Z");
        }

        backends[0].close().await;
    }
}
