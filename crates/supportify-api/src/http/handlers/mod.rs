//! HTTP request handlers for the REST API.

pub mod conversations;
pub mod health;
