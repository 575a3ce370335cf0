//! Shared domain types for Supportify.
//!
//! This crate contains the domain types used across the conversation relay:
//! chat turns and messages, upstream completion request/reply shapes, the
//! error taxonomy, and the application configuration.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
