//! Error handling module
//!
//! Centralized error types returned to the request layer.

use crate::storage::StorageError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("User not found: {0}")]
    UserNotFound(i64),

    #[error("Like not found: {0}")]
    LikeNotFound(i64),

    #[error("Conflict: user {user_id} was modified concurrently (expected version {expected}, found {found})")]
    Conflict {
        user_id: i64,
        expected: i64,
        found: i64,
    },

    // Server errors
    #[error("Storage error: {0}")]
    Storage(#[source] StorageError),
}

impl AppError {
    /// Check if this is a not-found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::UserNotFound(_) | AppError::LikeNotFound(_))
    }

    /// Check if this is a conflict error (retry may help)
    pub fn is_conflict(&self) -> bool {
        matches!(self, AppError::Conflict { .. })
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { entity: "user", id } => AppError::UserNotFound(id),
            StorageError::NotFound { entity: "like", id } => AppError::LikeNotFound(id),
            StorageError::VersionConflict {
                user_id,
                expected,
                found,
            } => AppError::Conflict {
                user_id,
                expected,
                found,
            },
            other => AppError::Storage(other),
        }
    }
}
