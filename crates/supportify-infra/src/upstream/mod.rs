//! Upstream chat-completion endpoint.

pub mod client;

pub use client::HttpCompletionClient;
