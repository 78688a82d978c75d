use thiserror::Error;

/// Engine fault taxonomy. Every exposed operation catches these at its
/// boundary and folds them into the uniform result envelope; nothing is
/// retried internally.
#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("authorization failed: {0}")]
    Authorization(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
}

impl AttendanceError {
    /// Stable machine-readable kind, independent of the human message.
    pub fn kind(&self) -> &'static str {
        match self {
            AttendanceError::NotFound(_) => "not_found",
            AttendanceError::Authorization(_) => "authorization",
            AttendanceError::Validation(_) => "validation",
            AttendanceError::Store(_) => "store",
        }
    }
}
