use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Cannot {operation} {entity} {id} while it is {status}")]
    InvalidState {
        entity: &'static str,
        id: Uuid,
        status: String,
        operation: &'static str,
    },

    #[error("Purchase list {list_id} has no items")]
    EmptyList { list_id: Uuid },

    #[error("{entity} {id} cannot move from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        id: Uuid,
        from: String,
        to: String,
    },

    #[error("{entity} {id} cannot enter {to}: {field} is required")]
    GuardCondition {
        entity: &'static str,
        id: Uuid,
        to: String,
        field: &'static str,
    },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Transient store error: {0}")]
    Transient(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Only store contention is safe to replay; every other error needs a
    /// corrected request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DomainError::Transient(_))
    }
}
