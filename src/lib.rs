//! film_social Library
//!
//! Preference, counter and notification engine behind the Film review
//! backend. The request layer calls the services and handlers exported here.

pub mod domain;
pub mod engagement;
pub mod handlers;
pub mod jobs;
pub mod ledger;
pub mod preferences;
pub mod projection;
pub mod storage;

pub mod config;
pub mod db;
mod error;
pub mod logging;

pub use config::Config;
pub use domain::{AssetKind, ContentItem, ContentKind, LikeEvent, TokenSet, User, UserSummary};
pub use engagement::{EngagementAggregator, EngagementTotals};
pub use error::{AppError, AppResult};
pub use ledger::{LikeEntry, NotificationLedger, UnreadLikes};
pub use preferences::{PreferenceStore, PreferenceUpdate};
pub use projection::{CounterReconciler, ReconcileReport};
pub use storage::{InMemoryStorage, PgStorage, Storage, StorageError};
