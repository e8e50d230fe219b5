//! Domain Entities
//!
//! Users, their content and the like events between them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TokenSet;

/// User record with its preference sets and cached counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub avatar: Option<String>,
    pub cover: Option<String>,

    /// Favor (genre) tags the user has expressed interest in
    pub favor_tags: TokenSet,

    /// Liked movie ids, kept in their string form
    pub liked_movie_ids: TokenSet,

    /// Cached `count(reviews where user_id = id)`
    pub review_count: i64,

    /// Cached `count(words where user_id = id)`
    pub words_count: i64,

    /// Optimistic lock over the preference fields
    pub version: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            avatar: self.avatar.clone(),
        }
    }
}

/// Display identity of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub avatar: Option<String>,
}

/// Kind of user-authored content
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Review,
    Words,
}

impl ContentKind {
    /// Backing table name
    pub fn table(self) -> &'static str {
        match self {
            ContentKind::Review => "reviews",
            ContentKind::Words => "words",
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentKind::Review => write!(f, "review"),
            ContentKind::Words => write!(f, "words"),
        }
    }
}

/// A review or a words (quote) entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: i64,
    pub kind: ContentKind,
    pub user_id: i64,
    pub title: String,
    pub like_num: i64,
    /// Related interaction count; always 0 for words
    pub review_num: i64,
    pub created_at: DateTime<Utc>,
}

/// One user liking another user's review.
///
/// Only `checked` ever changes after creation, and only from false to true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeEvent {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub content_id: i64,
    pub checked: bool,
    pub created_at: DateTime<Utc>,
}

impl LikeEvent {
    pub fn is_self_like(&self) -> bool {
        self.sender_id == self.receiver_id
    }
}

/// Profile image slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Avatar,
    Cover,
}

impl std::str::FromStr for AssetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "avatar" => Ok(AssetKind::Avatar),
            "cover" => Ok(AssetKind::Cover),
            other => Err(format!("unknown asset kind: {}", other)),
        }
    }
}
