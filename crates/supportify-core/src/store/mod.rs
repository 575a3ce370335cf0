//! Generic record store port.
//!
//! The store is a collection-keyed bag of JSON objects with equality filters
//! and single-field ordering. Adapters live in supportify-infra
//! (`SqliteRecordStore`, `InMemoryRecordStore`).

pub mod query;

pub use query::{Direction, Filter, Order, check_field_name};

use serde_json::{Map, Value};
use supportify_types::error::RepositoryError;

/// One stored object. Adapters add a string `id` field on insert.
pub type Record = Map<String, Value>;

/// Field that adapters populate with a generated identifier.
pub const RECORD_ID_FIELD: &str = "id";

/// Repository trait for schemaless record persistence.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition). Implementations
/// must tolerate concurrent independent calls; no locking is imposed by
/// callers.
pub trait RecordStore: Send + Sync {
    /// Insert all `records` into `collection` as one unit, in order.
    ///
    /// Returns the stored records, each carrying its assigned `id`.
    fn insert_many(
        &self,
        collection: &str,
        records: Vec<Record>,
    ) -> impl std::future::Future<Output = Result<Vec<Record>, RepositoryError>> + Send;

    /// Records matching every filter. Without `order`, insertion order.
    /// Ties under `order` keep insertion order.
    fn select(
        &self,
        collection: &str,
        filters: &[Filter],
        order: Option<&Order>,
    ) -> impl std::future::Future<Output = Result<Vec<Record>, RepositoryError>> + Send;

    /// Shallow-merge `patch` into every matching record. Returns the number
    /// of records changed.
    fn update(
        &self,
        collection: &str,
        filters: &[Filter],
        patch: Record,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Remove every matching record. Returns the number removed.
    fn delete(
        &self,
        collection: &str,
        filters: &[Filter],
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
