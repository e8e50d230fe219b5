//! Command definitions
//!
//! Commands and queries the request layer hands to the handlers.

use serde::{Deserialize, Serialize};

use crate::domain::{AssetKind, User};
use crate::error::{AppError, AppResult};

/// Largest page a user listing may ask for
pub const MAX_PAGE_LIMIT: u32 = 100;

// =========================================================================
// CollectFavorCommand
// =========================================================================

/// Record the genres and movie behind a user's "favor" action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectFavorCommand {
    pub user_id: i64,
    /// Whitespace-delimited genre tags
    pub types: String,
    pub movie_id: i64,
}

impl CollectFavorCommand {
    pub fn new(user_id: i64, types: impl Into<String>, movie_id: i64) -> Self {
        Self {
            user_id,
            types: types.into(),
            movie_id,
        }
    }

    /// Individual tags in input order
    pub fn tags(&self) -> Vec<String> {
        self.types.split_whitespace().map(str::to_string).collect()
    }
}

/// Result of a favor collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectFavorResult {
    pub user_id: i64,
    pub added_tags: Vec<String>,
    pub movie_added: bool,
}

// =========================================================================
// ListUsersQuery
// =========================================================================

/// Page through users, 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListUsersQuery {
    pub page: u32,
    pub limit: u32,
}

impl Default for ListUsersQuery {
    fn default() -> Self {
        Self { page: 1, limit: 10 }
    }
}

impl ListUsersQuery {
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.page == 0 {
            return Err(AppError::InvalidRequest("page starts at 1".to_string()));
        }
        if self.limit == 0 || self.limit > MAX_PAGE_LIMIT {
            return Err(AppError::InvalidRequest(format!(
                "limit must be between 1 and {}",
                MAX_PAGE_LIMIT
            )));
        }
        Ok(())
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.limit)
    }
}

/// One page of users plus the total user count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPage {
    pub count: i64,
    pub users: Vec<User>,
}

// =========================================================================
// UpdateAssetCommand
// =========================================================================

/// Point a user's avatar or cover at an uploaded image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAssetCommand {
    pub user_id: i64,
    pub kind: AssetKind,
    /// Stored file name under the public `images/` path
    pub filename: String,
}

impl UpdateAssetCommand {
    pub fn new(user_id: i64, kind: AssetKind, filename: impl Into<String>) -> Self {
        Self {
            user_id,
            kind,
            filename: filename.into(),
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        let name = self.filename.as_str();
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(AppError::InvalidRequest(format!(
                "invalid asset file name: {:?}",
                name
            )));
        }
        Ok(())
    }
}

/// Result of an asset update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateAssetResult {
    pub user_id: i64,
    pub kind: AssetKind,
    pub url: String,
}
