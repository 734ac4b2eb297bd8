use crate::tier::Tier;
use crate::types::{Date, DbId};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A business precondition does not hold for the current state
    /// (e.g. editing days on a fixed plan, enrolling into an empty course).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Tier entitlement, time unlock or enrollment capacity denied the request.
    #[error("Access denied: {reason}")]
    AccessDenied {
        reason: String,
        required_tier: Option<Tier>,
        unlock_at: Option<Date>,
    },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
