//! Backend seam of the menu subsystem.
//!
//! [`MenuRepository`] covers every menu call the editor makes and
//! [`FaqDirectory`] the FAQ lookups used to label `faq` items. The production
//! implementation talks to the admin REST API ([`http::HttpMenuRepository`]);
//! tests use [`crate::testing::InMemoryMenuRepository`].

pub mod http;
pub mod records;

use async_trait::async_trait;

use crate::core::error::AppResult;
use crate::menu::form::MenuItemPayload;
use crate::menu::model::{MenuItem, MenuItemId};
use crate::menu::reorder::ReorderEntry;

pub use records::{FaqEntry, MenuTemplate, RecordError, TemplateApplied};

/// Persistence operations for menu items.
#[async_trait]
pub trait MenuRepository: Send + Sync {
    /// Flat list of every stored item.
    async fn load(&self) -> AppResult<Vec<MenuItem>>;

    /// Alternate load path: the pre-built tree, flattened with the server's
    /// own `parent_id`/`sort_order`.
    async fn load_tree(&self) -> AppResult<Vec<MenuItem>>;

    /// Creates one item and returns it with its assigned id.
    async fn create(&self, payload: &MenuItemPayload) -> AppResult<MenuItem>;

    async fn update(&self, id: MenuItemId, payload: &MenuItemPayload) -> AppResult<MenuItem>;

    /// Deletes the item and its whole subtree.
    async fn delete(&self, id: MenuItemId) -> AppResult<()>;

    /// Persists a reorder batch in one request.
    async fn reorder(&self, entries: &[ReorderEntry]) -> AppResult<()>;

    /// Creates an inactive copy of one item (children are not copied).
    async fn duplicate(&self, id: MenuItemId) -> AppResult<MenuItem>;

    async fn templates(&self) -> AppResult<Vec<MenuTemplate>>;

    /// Builds the template's starter items, optionally wiping the menu first.
    async fn apply_template(&self, template_id: &str, clear_existing: bool) -> AppResult<TemplateApplied>;
}

/// Read access to FAQ entries.
#[async_trait]
pub trait FaqDirectory: Send + Sync {
    /// Every FAQ entry, across all pages.
    async fn faq_entries(&self) -> AppResult<Vec<FaqEntry>>;
}
