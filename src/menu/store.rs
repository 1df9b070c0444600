//! Id-keyed flat store; the only source of truth for menu state.
//!
//! Trees are always derived from it through [`MenuStore::tree`], so there is
//! never a second copy of `parent_id`/`sort_order` to keep in sync.

use std::collections::HashMap;

use itertools::Itertools;

use super::model::{MenuItem, MenuItemId};
use super::reorder::ReorderEntry;
use super::tree::{self, IntegrityIssue, MenuForest, TreeError};

#[derive(Debug, Clone, Default)]
pub struct MenuStore {
    items: HashMap<MenuItemId, MenuItem>,
}

impl MenuStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole content; later duplicates of an id win.
    pub fn from_items(items: impl IntoIterator<Item = MenuItem>) -> Self {
        Self {
            items: items.into_iter().map(|item| (item.id, item)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: MenuItemId) -> Option<&MenuItem> {
        self.items.get(&id)
    }

    pub fn contains(&self, id: MenuItemId) -> bool {
        self.items.contains_key(&id)
    }

    /// Inserts or replaces by id, returning the previous record.
    pub fn upsert(&mut self, item: MenuItem) -> Option<MenuItem> {
        self.items.insert(item.id, item)
    }

    /// Removes an item together with everything beneath it.
    ///
    /// Returns the removed items, the requested one first. Empty when the id
    /// is unknown.
    pub fn remove_cascade(&mut self, id: MenuItemId) -> Vec<MenuItem> {
        let Some(root) = self.items.remove(&id) else {
            return Vec::new();
        };
        let mut removed = vec![root];
        let mut frontier = vec![id];
        while let Some(parent) = frontier.pop() {
            let child_ids: Vec<MenuItemId> = self
                .items
                .values()
                .filter(|item| item.parent_id == Some(parent))
                .map(|item| item.id)
                .sorted()
                .collect();
            for child in child_ids {
                if let Some(item) = self.items.remove(&child) {
                    removed.push(item);
                    frontier.push(child);
                }
            }
        }
        removed
    }

    /// Direct children of `parent` (`None` = root), in display order.
    pub fn children(&self, parent: Option<MenuItemId>) -> Vec<&MenuItem> {
        self.items
            .values()
            .filter(|item| item.parent_id == parent)
            .sorted_by_key(|item| (item.sort_order, item.id))
            .collect()
    }

    /// `sort_order` that places a new item after every existing sibling.
    pub fn next_sort_order(&self, parent: Option<MenuItemId>) -> i32 {
        self.items
            .values()
            .filter(|item| item.parent_id == parent)
            .map(|item| item.sort_order)
            .max()
            .map_or(0, |max| max.saturating_add(1))
    }

    /// All items ordered by id.
    pub fn items(&self) -> Vec<MenuItem> {
        self.items.values().sorted_by_key(|item| item.id).cloned().collect()
    }

    /// Derives the nested view.
    pub fn tree(&self) -> Result<MenuForest, TreeError> {
        tree::build(&self.items())
    }

    pub fn integrity_report(&self) -> Vec<IntegrityIssue> {
        tree::integrity_report(&self.items())
    }

    /// Writes `parent_id`/`sort_order` from a reorder batch. Unknown ids are
    /// skipped and returned.
    pub fn apply_reorder(&mut self, entries: &[ReorderEntry]) -> Vec<MenuItemId> {
        let mut unknown = Vec::new();
        for entry in entries {
            match self.items.get_mut(&entry.id) {
                Some(item) => {
                    item.parent_id = entry.parent_id;
                    item.sort_order = entry.sort_order;
                }
                None => unknown.push(entry.id),
            }
        }
        unknown
    }
}
