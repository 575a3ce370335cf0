//! SQLite record store implementation.
//!
//! Implements `RecordStore` from `supportify-core` on a single `records`
//! table. Each record is kept as JSON text in `body`; filters and ordering
//! go through `json_extract`. Field names are checked before they are spliced
//! into a JSON path, values are always bound.

use chrono::Utc;
use serde_json::Value;
use sqlx::Row;
use sqlx::sqlite::{Sqlite, SqliteArguments};
use supportify_core::store::{
    Direction, Filter, Order, RECORD_ID_FIELD, Record, RecordStore, check_field_name,
};
use supportify_types::error::RepositoryError;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `RecordStore`.
#[derive(Clone)]
pub struct SqliteRecordStore {
    pool: DatabasePool,
}

impl SqliteRecordStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }
}

// ---------------------------------------------------------------------------
// Query building
// ---------------------------------------------------------------------------

enum Param {
    Text(String),
    Int(i64),
    Real(f64),
}

type Query<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

fn bind_all<'q>(mut query: Query<'q>, params: Vec<Param>) -> Query<'q> {
    for param in params {
        query = match param {
            Param::Text(s) => query.bind(s),
            Param::Int(i) => query.bind(i),
            Param::Real(f) => query.bind(f),
        };
    }
    query
}

/// `collection = ? AND ...` plus the parameters to bind, in order.
fn where_clause(collection: &str, filters: &[Filter]) -> Result<(String, Vec<Param>), RepositoryError> {
    let mut sql = String::from("collection = ?");
    let mut params = vec![Param::Text(collection.to_string())];

    for filter in filters {
        check_field_name(&filter.field)?;
        let path = format!("'$.{}'", filter.field);
        match &filter.value {
            Value::Null => sql.push_str(&format!(" AND json_type(body, {path}) = 'null'")),
            Value::Bool(b) => sql.push_str(&format!(" AND json_type(body, {path}) = '{b}'")),
            Value::String(s) => {
                sql.push_str(&format!(" AND json_type(body, {path}) = 'text' AND json_extract(body, {path}) = ?"));
                params.push(Param::Text(s.clone()));
            }
            Value::Number(n) => {
                sql.push_str(&format!(" AND json_extract(body, {path}) = ?"));
                params.push(match n.as_i64() {
                    Some(i) => Param::Int(i),
                    None => Param::Real(n.as_f64().unwrap_or(f64::NAN)),
                });
            }
            nested @ (Value::Array(_) | Value::Object(_)) => {
                sql.push_str(&format!(" AND json_extract(body, {path}) = json(?)"));
                params.push(Param::Text(nested.to_string()));
            }
        }
    }

    Ok((sql, params))
}

fn order_clause(order: Option<&Order>) -> Result<String, RepositoryError> {
    match order {
        None => Ok(" ORDER BY seq ASC".to_string()),
        Some(order) => {
            check_field_name(&order.field)?;
            let direction = match order.direction {
                Direction::Ascending => "ASC",
                Direction::Descending => "DESC",
            };
            Ok(format!(
                " ORDER BY json_extract(body, '$.{}') {direction}, seq ASC",
                order.field
            ))
        }
    }
}

fn parse_body(body: &str) -> Result<Record, RepositoryError> {
    match serde_json::from_str(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(RepositoryError::Query("record body is not an object".to_string())),
        Err(e) => Err(RepositoryError::Query(format!("invalid JSON body: {e}"))),
    }
}

fn to_body(record: &Record) -> Result<String, RepositoryError> {
    serde_json::to_string(record)
        .map_err(|e| RepositoryError::Query(format!("failed to serialize record: {e}")))
}

fn query_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(e.to_string())
}

// ---------------------------------------------------------------------------
// RecordStore implementation
// ---------------------------------------------------------------------------

impl RecordStore for SqliteRecordStore {
    async fn insert_many(
        &self,
        collection: &str,
        records: Vec<Record>,
    ) -> Result<Vec<Record>, RepositoryError> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;
        let mut stored = Vec::with_capacity(records.len());

        for mut record in records {
            let id = Uuid::now_v7().to_string();
            record.insert(RECORD_ID_FIELD.to_string(), Value::String(id.clone()));

            sqlx::query("INSERT INTO records (id, collection, body, created_at) VALUES (?, ?, ?, ?)")
                .bind(&id)
                .bind(collection)
                .bind(to_body(&record)?)
                .bind(&now)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    if let sqlx::Error::Database(ref db_err) = e {
                        if db_err.message().contains("UNIQUE") {
                            return RepositoryError::Conflict(format!("record {id} already exists"));
                        }
                    }
                    query_error(e)
                })?;

            stored.push(record);
        }

        tx.commit().await.map_err(query_error)?;
        Ok(stored)
    }

    async fn select(
        &self,
        collection: &str,
        filters: &[Filter],
        order: Option<&Order>,
    ) -> Result<Vec<Record>, RepositoryError> {
        let (clause, params) = where_clause(collection, filters)?;
        let sql = format!("SELECT body FROM records WHERE {clause}{}", order_clause(order)?);

        let rows = bind_all(sqlx::query(&sql), params)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_error)?;

        rows.iter()
            .map(|row| {
                let body: String = row.try_get("body").map_err(query_error)?;
                parse_body(&body)
            })
            .collect()
    }

    async fn update(
        &self,
        collection: &str,
        filters: &[Filter],
        mut patch: Record,
    ) -> Result<u64, RepositoryError> {
        // Identifiers are assigned by the store and never patched.
        patch.remove(RECORD_ID_FIELD);

        let (clause, params) = where_clause(collection, filters)?;
        let sql = format!("SELECT seq, body FROM records WHERE {clause}");

        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;
        let rows = bind_all(sqlx::query(&sql), params)
            .fetch_all(&mut *tx)
            .await
            .map_err(query_error)?;

        let mut changed = 0;
        for row in &rows {
            let seq: i64 = row.try_get("seq").map_err(query_error)?;
            let body: String = row.try_get("body").map_err(query_error)?;
            let mut record = parse_body(&body)?;
            record.extend(patch.clone());

            sqlx::query("UPDATE records SET body = ? WHERE seq = ?")
                .bind(to_body(&record)?)
                .bind(seq)
                .execute(&mut *tx)
                .await
                .map_err(query_error)?;
            changed += 1;
        }

        tx.commit().await.map_err(query_error)?;
        Ok(changed)
    }

    async fn delete(&self, collection: &str, filters: &[Filter]) -> Result<u64, RepositoryError> {
        let (clause, params) = where_clause(collection, filters)?;
        let sql = format!("DELETE FROM records WHERE {clause}");

        let result = bind_all(sqlx::query(&sql), params)
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        Ok(result.rows_affected())
    }
}
