//! Subadmin - menu configuration console for a Telegram subscription bot
//!
//! This library holds the menu subsystem of the admin console: the menu
//! item model, the flat-list/tree transforms, the bot-accurate preview,
//! drag/drop reordering and the item form, plus the REST client for the
//! admin backend.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors and logging
//! - `menu`: menu model, tree, visibility, navigator, reorder, form, editor
//! - `api`: repository seam and its REST implementation
//! - `i18n`: bot-facing strings
//! - `testing`: in-memory repository for tests

pub mod api;
pub mod cli;
pub mod core;
pub mod i18n;
pub mod menu;
pub mod testing;

// Re-export commonly used types for convenience
pub use api::{http::HttpMenuRepository, FaqDirectory, MenuRepository};
pub use crate::core::{config, AppError, AppResult};
pub use menu::{MenuEditor, MenuItem, MenuItemId, MenuNavigator, ViewerContext};
