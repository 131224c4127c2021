// ABOUTME: Error types for the conversation package
// ABOUTME: Machine-readable failures so callers can tell retry-later from not-found from not-yours

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConversationError {
    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("Specification not found: {0}")]
    SpecificationNotFound(String),

    #[error("Access denied: caller does not own this resource")]
    Forbidden,

    /// A persisted stage value outside the four canonical states. The stored
    /// record is never mutated when this is raised.
    #[error("Invalid conversation stage: {0}")]
    InvalidStage(String),

    /// The optimistic revision check failed; another writer got there first.
    #[error("Conversation {0} was modified concurrently")]
    RevisionConflict(String),

    #[error("Message must not be empty")]
    EmptyMessage,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Domain enrichment failed: {0}")]
    Enrichment(String),

    #[error("Specification generation failed: {0}")]
    SpecGeneration(String),
}

pub type Result<T> = std::result::Result<T, ConversationError>;
