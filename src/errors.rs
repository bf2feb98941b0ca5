//! Error types for catalogue lifecycle operations

use thiserror::Error;
use uuid::Uuid;

use crate::domain::ResourceKind;
use crate::state_machine::TransitionError;

/// Errors that can occur in catalogue lifecycle operations
#[derive(Debug, Error)]
pub enum CatalogueError {
    /// Business rule violation (invalid status term, editing a mirror, ...)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Resource or owner does not exist at the expected key
    #[error("{kind} '{id}' not found in catalogue '{catalogue_id}'")]
    NotFound {
        kind: ResourceKind,
        id: String,
        catalogue_id: String,
    },

    /// Request is well-formed but inconsistent with current state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Status transition rejected by the lifecycle state machine
    #[error("Invalid lifecycle transition: {0}")]
    Transition(#[from] TransitionError),

    /// Ownership move stopped between steps and awaits reconciliation
    #[error("Ownership move {intent_id} incomplete: {reason}")]
    MoveIncomplete { intent_id: Uuid, reason: String },

    /// Resource store failure
    #[error("Store error: {0}")]
    Store(String),

    /// Outbox or dispatcher failure
    #[error("Dispatch error: {0}")]
    Dispatch(String),

    /// Notifier failure
    #[error("Notification error: {0}")]
    Notification(String),

    /// NATS connection or publish error
    #[error("NATS error: {0}")]
    Nats(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for catalogue operations
pub type CatalogueResult<T> = Result<T, CatalogueError>;

impl CatalogueError {
    /// Build a `NotFound` error for a keyed lookup
    pub fn not_found(kind: ResourceKind, id: impl Into<String>, catalogue_id: impl Into<String>) -> Self {
        CatalogueError::NotFound {
            kind,
            id: id.into(),
            catalogue_id: catalogue_id.into(),
        }
    }

    /// Whether this is a business-rule violation surfaced to the caller
    pub fn is_validation(&self) -> bool {
        matches!(self, CatalogueError::Validation(_) | CatalogueError::Transition(_))
    }

    /// Whether the target did not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogueError::NotFound { .. })
    }

    /// Whether the request conflicted with current state
    pub fn is_conflict(&self) -> bool {
        matches!(self, CatalogueError::Conflict(_))
    }
}

impl From<serde_json::Error> for CatalogueError {
    fn from(err: serde_json::Error) -> Self {
        CatalogueError::Serialization(err.to_string())
    }
}

impl From<async_nats::Error> for CatalogueError {
    fn from(err: async_nats::Error) -> Self {
        CatalogueError::Nats(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = CatalogueError::not_found(ResourceKind::Service, "prov.svc", "eosc");
        assert_eq!(err.to_string(), "service 'prov.svc' not found in catalogue 'eosc'");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_transition_errors_count_as_validation() {
        let err: CatalogueError = TransitionError::InvalidTransition {
            from: "approved".to_string(),
            to: "pending".to_string(),
        }
        .into();
        assert!(err.is_validation());
        assert!(!err.is_conflict());
    }
}
