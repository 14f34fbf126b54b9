use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The request is well-formed but violates a relationship rule
    /// (e.g. deleting a category that still has products).
    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    /// Token missing, malformed, expired, forged, or naming a user that no
    /// longer exists. Carries no detail.
    #[error("Invalid credential")]
    InvalidCredential,

    #[error("Rate limit exceeded, retry after {retry_after_secs}s")]
    RateExceeded { retry_after_secs: u64 },

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Missing or invalid startup configuration. Never produced while serving.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
