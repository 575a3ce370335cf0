//! Upstream chat-completion port and reply validation.

pub mod provider;
pub mod validate;

pub use provider::CompletionProvider;
pub use validate::validate_completion;
