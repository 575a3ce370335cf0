use std::time::Duration;

use thiserror::Error;

/// Errors from record store operations (used by trait definitions in supportify-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Rejected input when constructing domain values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("field '{0}' must not be empty")]
    EmptyField(&'static str),

    #[error("invalid field name '{0}'")]
    InvalidFieldName(String),
}

/// A detached batched write of a turn's messages failed.
///
/// Only ever logged; never returned to the caller of a turn.
#[derive(Debug, Error)]
#[error("failed to persist turn for user '{user_id}' (agent '{agent_id}', org '{org_id}'): {source}")]
pub struct PersistenceError {
    pub user_id: String,
    pub agent_id: String,
    pub org_id: String,
    #[source]
    pub source: RepositoryError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_persistence_error_display_includes_identifiers() {
        let err = PersistenceError {
            user_id: "u1".to_string(),
            agent_id: "a1".to_string(),
            org_id: "o1".to_string(),
            source: RepositoryError::Timeout(Duration::from_secs(30)),
        };
        let text = err.to_string();
        assert!(text.contains("u1"));
        assert!(text.contains("a1"));
        assert!(text.contains("timed out after 30s"));
    }

    #[test]
    fn test_timeout_keeps_sub_second_precision() {
        let err = RepositoryError::Timeout(Duration::from_millis(250));
        assert_eq!(err.to_string(), "store operation timed out after 250ms");
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::EmptyField("content");
        assert_eq!(err.to_string(), "field 'content' must not be empty");
    }
}
