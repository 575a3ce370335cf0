//! SQLite storage layer.
//!
//! A schemaless [`RecordStore`](supportify_core::store::RecordStore) backed by
//! SQLite with WAL mode and split read/write connection pools.

pub mod pool;
pub mod records;
