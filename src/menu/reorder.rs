//! Drag/drop moves over the in-memory tree and the batch sent afterwards.
//!
//! A move is applied to the forest, the forest is renumbered, and the whole
//! forest is flattened into one `{id, parent_id, sort_order}` batch. A failed
//! move leaves the forest untouched.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use super::model::MenuItemId;
use super::tree::{self, MenuForest, MenuNode};

/// Reorder errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReorderError {
    #[error("item {0} does not exist")]
    UnknownItem(MenuItemId),

    #[error("target parent {0} does not exist")]
    UnknownParent(MenuItemId),

    #[error("target parent {0} is not a section")]
    TargetNotSection(MenuItemId),

    #[error("moving {id} under {target} would put it inside its own subtree")]
    WouldCreateCycle { id: MenuItemId, target: MenuItemId },

    #[error("invalid sibling order: {0}")]
    InvalidOrder(String),
}

/// A drag/drop gesture: put `id` under `new_parent` at `position`.
///
/// Positions past the end append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRequest {
    pub id: MenuItemId,
    pub new_parent: Option<MenuItemId>,
    pub position: usize,
}

/// One row of the reorder batch.
///
/// On the wire root is `0`: the backend reads a null `parent_id` as
/// "leave unchanged" and anything `<= 0` as root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderEntry {
    pub id: MenuItemId,
    #[serde(serialize_with = "serialize_parent", deserialize_with = "deserialize_parent")]
    pub parent_id: Option<MenuItemId>,
    pub sort_order: i32,
}

fn serialize_parent<S: Serializer>(parent: &Option<MenuItemId>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_i64(parent.map_or(0, |id| id.0))
}

fn deserialize_parent<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<MenuItemId>, D::Error> {
    let raw: Option<i64> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|id| *id > 0).map(MenuItemId))
}

/// Checks a move without touching the forest.
pub fn validate_move(forest: &[MenuNode], request: &MoveRequest) -> Result<(), ReorderError> {
    let moved = tree::find(forest, request.id).ok_or(ReorderError::UnknownItem(request.id))?;
    let Some(target) = request.new_parent else {
        return Ok(());
    };
    if moved.contains(target) {
        return Err(ReorderError::WouldCreateCycle {
            id: request.id,
            target,
        });
    }
    let parent = tree::find(forest, target).ok_or(ReorderError::UnknownParent(target))?;
    if !parent.item.is_section() {
        return Err(ReorderError::TargetNotSection(target));
    }
    Ok(())
}

/// Applies a move and renumbers every sibling group.
pub fn apply_move(forest: &mut MenuForest, request: &MoveRequest) -> Result<(), ReorderError> {
    validate_move(forest, request)?;

    let node = detach(forest, request.id).ok_or(ReorderError::UnknownItem(request.id))?;
    let level = match request.new_parent {
        None => &mut *forest,
        Some(target) => match tree::find_mut(forest, target) {
            Some(parent) => &mut parent.children,
            None => return Err(ReorderError::UnknownParent(target)),
        },
    };
    let position = request.position.min(level.len());
    level.insert(position, node);

    tree::renumber(forest);
    Ok(())
}

fn detach(level: &mut Vec<MenuNode>, id: MenuItemId) -> Option<MenuNode> {
    if let Some(index) = level.iter().position(|node| node.id() == id) {
        return Some(level.remove(index));
    }
    level.iter_mut().find_map(|node| detach(&mut node.children, id))
}

/// Rearranges one sibling group into `order`, which must list every sibling
/// exactly once.
pub fn reorder_siblings(
    forest: &mut MenuForest,
    parent: Option<MenuItemId>,
    order: &[MenuItemId],
) -> Result<(), ReorderError> {
    let level = match parent {
        None => &mut *forest,
        Some(id) => match tree::find_mut(forest, id) {
            Some(node) => &mut node.children,
            None => return Err(ReorderError::UnknownParent(id)),
        },
    };

    if order.len() != level.len() {
        return Err(ReorderError::InvalidOrder(format!(
            "expected {} ids, got {}",
            level.len(),
            order.len()
        )));
    }

    let mut remaining = std::mem::take(level);
    let mut arranged = Vec::with_capacity(remaining.len());
    for id in order {
        match remaining.iter().position(|node| node.id() == *id) {
            Some(index) => arranged.push(remaining.remove(index)),
            None => {
                // Put everything back before reporting
                remaining.extend(arranged);
                remaining.sort_by_key(|node| (node.item.sort_order, node.id()));
                *level = remaining;
                return Err(ReorderError::InvalidOrder(format!(
                    "{} is not a child of {}",
                    id,
                    parent.map_or_else(|| "root".to_string(), |p| p.to_string())
                )));
            }
        }
    }
    *level = arranged;

    tree::renumber(forest);
    Ok(())
}

/// The full reassignment for the whole forest, pre-order.
pub fn batch(forest: &[MenuNode]) -> Vec<ReorderEntry> {
    tree::flatten(forest)
        .into_iter()
        .map(|item| ReorderEntry {
            id: item.id,
            parent_id: item.parent_id,
            sort_order: item.sort_order,
        })
        .collect()
}
