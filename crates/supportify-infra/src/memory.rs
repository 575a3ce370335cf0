//! Process-local record store.
//!
//! Backs `supportify serve --memory` and tests that need a real store
//! without a database file. Contents are lost when the process exits.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value;
use supportify_core::store::{
    Direction, Filter, Order, RECORD_ID_FIELD, Record, RecordStore, check_field_name,
};
use supportify_types::error::RepositoryError;
use uuid::Uuid;

/// `RecordStore` over a map of collection name to records in insertion order.
#[derive(Default)]
pub struct InMemoryRecordStore {
    collections: RwLock<HashMap<String, Vec<Record>>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total records across all collections.
    pub fn len(&self) -> usize {
        self.collections
            .read()
            .map(|c| c.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> RepositoryError {
    RepositoryError::Query("record store lock poisoned".to_string())
}

fn check_fields(filters: &[Filter]) -> Result<(), RepositoryError> {
    filters.iter().try_for_each(|f| check_field_name(&f.field))
}

fn matches_all(record: &Record, filters: &[Filter]) -> bool {
    filters.iter().all(|f| f.matches(record))
}

/// Missing and null sort first, then booleans, numbers, strings.
/// Arrays and objects compare equal to each other.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(Value::Array(_) | Value::Object(_)) => 4,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

impl RecordStore for InMemoryRecordStore {
    async fn insert_many(
        &self,
        collection: &str,
        records: Vec<Record>,
    ) -> Result<Vec<Record>, RepositoryError> {
        let stored: Vec<Record> = records
            .into_iter()
            .map(|mut record| {
                let id = Uuid::now_v7().to_string();
                record.insert(RECORD_ID_FIELD.to_string(), Value::String(id));
                record
            })
            .collect();

        let mut collections = self.collections.write().map_err(poisoned)?;
        collections
            .entry(collection.to_string())
            .or_default()
            .extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn select(
        &self,
        collection: &str,
        filters: &[Filter],
        order: Option<&Order>,
    ) -> Result<Vec<Record>, RepositoryError> {
        check_fields(filters)?;
        if let Some(order) = order {
            check_field_name(&order.field)?;
        }

        let mut matched: Vec<Record> = {
            let collections = self.collections.read().map_err(poisoned)?;
            collections
                .get(collection)
                .map(|records| {
                    records
                        .iter()
                        .filter(|r| matches_all(r, filters))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        };

        if let Some(order) = order {
            // sort_by is stable, so ties keep insertion order.
            matched.sort_by(|a, b| {
                let ordering = compare_values(a.get(&order.field), b.get(&order.field));
                match order.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }
        Ok(matched)
    }

    async fn update(
        &self,
        collection: &str,
        filters: &[Filter],
        mut patch: Record,
    ) -> Result<u64, RepositoryError> {
        check_fields(filters)?;
        patch.remove(RECORD_ID_FIELD);

        let mut collections = self.collections.write().map_err(poisoned)?;
        let mut changed = 0;
        if let Some(records) = collections.get_mut(collection) {
            for record in records.iter_mut().filter(|r| matches_all(r, filters)) {
                record.extend(patch.clone());
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn delete(&self, collection: &str, filters: &[Filter]) -> Result<u64, RepositoryError> {
        check_fields(filters)?;

        let mut collections = self.collections.write().map_err(poisoned)?;
        let Some(records) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = records.len();
        records.retain(|r| !matches_all(r, filters));
        Ok((before - records.len()) as u64)
    }
}
