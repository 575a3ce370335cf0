//! HTTP/REST API layer for Supportify.
//!
//! Axum-based REST API at `/api/v1/` with a `{success, data}` envelope,
//! `{success: false, message}` errors, and CORS support.

pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
