//! Infrastructure layer for Supportify.
//!
//! Contains implementations of the ports defined in `supportify-core`:
//! the HTTP upstream completion client, SQLite and in-memory record stores,
//! plus configuration and data directory resolution.

pub mod backend;
pub mod config;
pub mod memory;
pub mod sqlite;
pub mod upstream;
