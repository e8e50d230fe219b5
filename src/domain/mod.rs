//! Domain module
//!
//! Core domain types: entities and the token-set codec.

pub mod entities;
pub mod token_set;

pub use entities::{AssetKind, ContentItem, ContentKind, LikeEvent, User, UserSummary};
pub use token_set::TokenSet;
