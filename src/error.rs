//! Error types for the counselling service.

use std::time::Duration;

use uuid::Uuid;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Journey error: {0}")]
    Journey(#[from] JourneyError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// LLM provider errors.
///
/// These never escape the advice path: the generator absorbs them and
/// falls back to canned advice.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} unavailable: {reason}")]
    Unavailable { provider: String, reason: String },

    #[error("Provider {provider} timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },

    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// Errors raised by the stage machine, the shortlist ledger and the
/// action pipeline.
#[derive(Debug, thiserror::Error)]
pub enum JourneyError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Student {student_id} already has university {locked_university_id} locked")]
    AlreadyLocked {
        student_id: Uuid,
        locked_university_id: Uuid,
    },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Validation failed: {reason}")]
    ValidationFailed { reason: String },

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl JourneyError {
    pub fn student_not_found(id: Uuid) -> Self {
        Self::NotFound {
            entity: "student",
            id: id.to_string(),
        }
    }

    pub fn university_not_found(id: Uuid) -> Self {
        Self::NotFound {
            entity: "university",
            id: id.to_string(),
        }
    }

    pub fn entry_not_found(student_id: Uuid, university_id: Uuid) -> Self {
        Self::NotFound {
            entity: "shortlist entry",
            id: format!("{student_id}/{university_id}"),
        }
    }

    /// Stable machine-readable kind, used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::AlreadyLocked { .. } => "already_locked",
            Self::InvalidState(_) => "invalid_state",
            Self::ValidationFailed { .. } => "validation_failed",
            Self::Database(_) => "database",
        }
    }
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn journey_error_kinds() {
        let id = Uuid::new_v4();
        assert_eq!(JourneyError::student_not_found(id).kind(), "not_found");
        assert_eq!(
            JourneyError::AlreadyLocked {
                student_id: id,
                locked_university_id: id,
            }
            .kind(),
            "already_locked"
        );
        assert_eq!(JourneyError::InvalidState("x".into()).kind(), "invalid_state");
        assert_eq!(
            JourneyError::Database(DatabaseError::Query("boom".into())).kind(),
            "database"
        );
    }

    #[test]
    fn not_found_message_names_entity() {
        let s = Uuid::new_v4();
        let u = Uuid::new_v4();
        let msg = JourneyError::entry_not_found(s, u).to_string();
        assert!(msg.starts_with("shortlist entry not found"));
        assert!(msg.contains(&u.to_string()));
    }

    #[test]
    fn database_error_converts_into_top_level() {
        let err: Error = DatabaseError::Migration("v2".into()).into();
        assert!(matches!(err, Error::Database(_)));
        let err: Error = JourneyError::InvalidState("nope".into()).into();
        assert_eq!(err.to_string(), "Journey error: Invalid state: nope");
    }
}
