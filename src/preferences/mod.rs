//! Preferences module
//!
//! Favor tags and liked movies per user.

mod locks;
mod store;

pub use locks::UserLocks;
pub use store::{PreferenceStore, PreferenceUpdate};
