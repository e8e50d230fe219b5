//! Command Handlers module
//!
//! Typed entry points for the request layer. Each handler validates its
//! command and coordinates the preference, projection and storage services.

mod asset_handler;
mod commands;
mod favor_handler;
mod user_listing_handler;

#[cfg(test)]
mod tests;

pub use asset_handler::UpdateAssetHandler;
pub use commands::*;
pub use favor_handler::CollectFavorHandler;
pub use user_listing_handler::ListUsersHandler;
