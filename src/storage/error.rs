//! Storage Errors
//!
//! Error types for storage backend operations.

/// Errors that can occur in a storage backend
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Referenced row does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// Optimistic lock on the user's preference fields failed
    #[error("Version conflict for user {user_id}: expected {expected}, found {found}")]
    VersionConflict {
        user_id: i64,
        expected: i64,
        found: i64,
    },

    /// Backend could not serve the request
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Operation exceeded its deadline
    #[error("Storage operation timed out")]
    Timeout,
}

impl StorageError {
    pub fn user_not_found(id: i64) -> Self {
        Self::NotFound { entity: "user", id }
    }

    pub fn like_not_found(id: i64) -> Self {
        Self::NotFound { entity: "like", id }
    }

    /// Check if this error is an optimistic lock failure
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, StorageError::VersionConflict { .. })
    }

    /// Check if this error is transient
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StorageError::Database(_)
                | StorageError::Unavailable(_)
                | StorageError::Timeout
                | StorageError::VersionConflict { .. }
        )
    }
}
