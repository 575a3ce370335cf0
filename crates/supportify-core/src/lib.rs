//! Business logic and port definitions for Supportify.
//!
//! This crate defines the ports ([`completion::CompletionProvider`],
//! [`store::RecordStore`]) that the infrastructure layer implements, plus the
//! conversation pipeline built on top of them. It depends only on
//! `supportify-types` and `supportify-observe`, never on an IO crate.

pub mod chat;
pub mod completion;
pub mod store;
