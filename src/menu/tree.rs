//! Flat list ⇄ nested tree.
//!
//! [`build`] groups items by `parent_id` and attaches each group, sorted by
//! `sort_order` (ties broken by id), under its parent. [`flatten`] walks the
//! forest pre-order and re-derives `parent_id` and a contiguous `sort_order`
//! from the current position of every node.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use itertools::Itertools;
use thiserror::Error;

use super::model::{ItemType, MenuItem, MenuItemId};

/// A menu item together with its derived children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuNode {
    pub item: MenuItem,
    pub children: Vec<MenuNode>,
}

/// Top-level nodes, in order.
pub type MenuForest = Vec<MenuNode>;

impl MenuNode {
    pub fn leaf(item: MenuItem) -> Self {
        Self {
            item,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> MenuItemId {
        self.item.id
    }

    /// True if `id` is this node or any of its descendants.
    pub fn contains(&self, id: MenuItemId) -> bool {
        self.id() == id || self.children.iter().any(|child| child.contains(id))
    }

    /// Ids of this node's subtree (the node itself excluded), pre-order.
    pub fn descendant_ids(&self) -> Vec<MenuItemId> {
        let mut out = Vec::new();
        for child in &self.children {
            out.push(child.id());
            out.extend(child.descendant_ids());
        }
        out
    }
}

/// Finds a node anywhere in the forest.
pub fn find(forest: &[MenuNode], id: MenuItemId) -> Option<&MenuNode> {
    for node in forest {
        if node.id() == id {
            return Some(node);
        }
        if let Some(found) = find(&node.children, id) {
            return Some(found);
        }
    }
    None
}

pub fn find_mut(forest: &mut [MenuNode], id: MenuItemId) -> Option<&mut MenuNode> {
    for node in forest.iter_mut() {
        if node.id() == id {
            return Some(node);
        }
        if let Some(found) = find_mut(&mut node.children, id) {
            return Some(found);
        }
    }
    None
}

/// Sibling group under `parent` (`None` = root level).
pub fn children_of(forest: &[MenuNode], parent: Option<MenuItemId>) -> Option<&[MenuNode]> {
    match parent {
        None => Some(forest),
        Some(id) => find(forest, id).map(|node| node.children.as_slice()),
    }
}

/// Total number of nodes in the forest.
pub fn count(forest: &[MenuNode]) -> usize {
    forest.iter().map(|node| 1 + count(&node.children)).sum()
}

/// A data-integrity problem in a flat list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityIssue {
    /// Two records share an id
    DuplicateId { id: MenuItemId },
    /// `parent_id` references an item that does not exist
    MissingParent { id: MenuItemId, parent_id: MenuItemId },
    /// Following `parent_id` from this item never reaches the root
    Cycle { id: MenuItemId },
    /// Item hangs under a non-section parent
    ChildOfLeaf {
        id: MenuItemId,
        parent_id: MenuItemId,
        parent_type: ItemType,
    },
    /// Siblings share a `sort_order` (ordering falls back to id)
    DuplicateSortOrder {
        parent_id: Option<MenuItemId>,
        sort_order: i32,
    },
}

impl IntegrityIssue {
    /// Fatal issues prevent building a tree; the rest are warnings.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, IntegrityIssue::DuplicateSortOrder { .. })
    }
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityIssue::DuplicateId { id } => write!(f, "duplicate id {}", id),
            IntegrityIssue::MissingParent { id, parent_id } => {
                write!(f, "item {} references missing parent {}", id, parent_id)
            }
            IntegrityIssue::Cycle { id } => write!(f, "item {} is part of a parent cycle", id),
            IntegrityIssue::ChildOfLeaf {
                id,
                parent_id,
                parent_type,
            } => write!(
                f,
                "item {} is a child of {} item {} (only sections may have children)",
                id, parent_type, parent_id
            ),
            IntegrityIssue::DuplicateSortOrder { parent_id, sort_order } => match parent_id {
                Some(parent) => write!(f, "sort_order {} repeats under section {}", sort_order, parent),
                None => write!(f, "sort_order {} repeats at root level", sort_order),
            },
        }
    }
}

/// Tree building errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("{} integrity issue(s): {}", .0.len(), .0.iter().join("; "))]
    Integrity(Vec<IntegrityIssue>),
}

impl TreeError {
    pub fn issues(&self) -> &[IntegrityIssue] {
        match self {
            TreeError::Integrity(issues) => issues,
        }
    }
}

/// Checks a flat list for every integrity problem, fatal or not.
///
/// Issues are reported in a stable order: per-item problems by id, then
/// cycles, then duplicate sort orders.
pub fn integrity_report(items: &[MenuItem]) -> Vec<IntegrityIssue> {
    let mut issues = Vec::new();
    let mut by_id: HashMap<MenuItemId, &MenuItem> = HashMap::with_capacity(items.len());

    for item in items.iter().sorted_by_key(|item| item.id) {
        if by_id.insert(item.id, item).is_some() {
            issues.push(IntegrityIssue::DuplicateId { id: item.id });
        }
    }

    for item in items.iter().sorted_by_key(|item| item.id) {
        let Some(parent_id) = item.parent_id else {
            continue;
        };
        match by_id.get(&parent_id) {
            None => issues.push(IntegrityIssue::MissingParent { id: item.id, parent_id }),
            Some(parent) if !parent.is_section() => issues.push(IntegrityIssue::ChildOfLeaf {
                id: item.id,
                parent_id,
                parent_type: parent.item_type(),
            }),
            Some(_) => {}
        }
    }

    // One report per cycle, keyed by the smallest id on it.
    let mut cycles = BTreeSet::new();
    for start in by_id.keys().sorted() {
        let mut path: Vec<MenuItemId> = Vec::new();
        let mut on_path: HashSet<MenuItemId> = HashSet::new();
        let mut current = Some(*start);
        // Hop bound: a valid chain is never longer than the item count.
        while let Some(id) = current {
            if !on_path.insert(id) {
                let cycle_start = path.iter().position(|p| *p == id).unwrap_or(0);
                if let Some(min) = path[cycle_start..].iter().min() {
                    cycles.insert(*min);
                }
                break;
            }
            path.push(id);
            if path.len() > by_id.len() {
                break;
            }
            current = by_id.get(&id).and_then(|item| item.parent_id);
        }
    }
    issues.extend(cycles.into_iter().map(|id| IntegrityIssue::Cycle { id }));

    let groups = items.iter().into_group_map_by(|item| item.parent_id);
    for (parent_id, siblings) in groups.into_iter().sorted_by_key(|(parent, _)| *parent) {
        let repeated = siblings
            .iter()
            .map(|item| item.sort_order)
            .duplicates()
            .sorted()
            .collect_vec();
        issues.extend(
            repeated
                .into_iter()
                .map(|sort_order| IntegrityIssue::DuplicateSortOrder { parent_id, sort_order }),
        );
    }

    issues
}

/// Builds the nested forest from a flat list.
///
/// Orphans, cycles, duplicate ids and children of non-section items are
/// surfaced as [`TreeError::Integrity`]; nothing is dropped silently.
/// Repeated `sort_order` values are tolerated and ordered by id.
pub fn build(items: &[MenuItem]) -> Result<MenuForest, TreeError> {
    let fatal: Vec<IntegrityIssue> = integrity_report(items)
        .into_iter()
        .filter(IntegrityIssue::is_fatal)
        .collect();
    if !fatal.is_empty() {
        return Err(TreeError::Integrity(fatal));
    }

    let mut groups: HashMap<Option<MenuItemId>, Vec<&MenuItem>> = items.iter().into_group_map_by(|item| item.parent_id);
    for siblings in groups.values_mut() {
        siblings.sort_by_key(|item| (item.sort_order, item.id));
    }

    Ok(attach(None, &groups))
}

fn attach(parent: Option<MenuItemId>, groups: &HashMap<Option<MenuItemId>, Vec<&MenuItem>>) -> MenuForest {
    groups
        .get(&parent)
        .map(|siblings| {
            siblings
                .iter()
                .map(|item| MenuNode {
                    item: (*item).clone(),
                    children: attach(Some(item.id), groups),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Flattens the forest pre-order, re-deriving `parent_id` from nesting and
/// `sort_order` from the position among siblings (0-based, contiguous).
pub fn flatten(forest: &[MenuNode]) -> Vec<MenuItem> {
    let mut out = Vec::with_capacity(count(forest));
    flatten_into(forest, None, &mut out);
    out
}

fn flatten_into(level: &[MenuNode], parent: Option<MenuItemId>, out: &mut Vec<MenuItem>) {
    for (position, node) in level.iter().enumerate() {
        let mut item = node.item.clone();
        item.parent_id = parent;
        item.sort_order = position as i32;
        out.push(item);
        flatten_into(&node.children, Some(node.id()), out);
    }
}

/// Writes the position-derived `parent_id` / `sort_order` back into the nodes,
/// so the in-memory forest agrees with what [`flatten`] would emit.
pub fn renumber(forest: &mut [MenuNode]) {
    renumber_level(forest, None);
}

fn renumber_level(level: &mut [MenuNode], parent: Option<MenuItemId>) {
    for (position, node) in level.iter_mut().enumerate() {
        node.item.parent_id = parent;
        node.item.sort_order = position as i32;
        let id = node.id();
        renumber_level(&mut node.children, Some(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::model::{ItemKind, SystemAction};
    use pretty_assertions::assert_eq;

    fn section(id: i64, parent: Option<i64>, sort: i32) -> MenuItem {
        let mut item = MenuItem::new(id, parent, ItemKind::Section, format!("section {}", id));
        item.sort_order = sort;
        item
    }

    fn text(id: i64, parent: Option<i64>, sort: i32) -> MenuItem {
        let mut item = MenuItem::new(
            id,
            parent,
            ItemKind::Text {
                body: format!("body {}", id),
            },
            format!("text {}", id),
        );
        item.sort_order = sort;
        item
    }

    fn ids(level: &[MenuNode]) -> Vec<i64> {
        level.iter().map(|node| node.id().0).collect()
    }

    // ==================== build Tests ====================

    #[test]
    fn test_build_empty_collection() {
        assert_eq!(build(&[]).unwrap(), Vec::<MenuNode>::new());
        assert!(flatten(&[]).is_empty());
    }

    #[test]
    fn test_build_nests_and_sorts_every_level() {
        let items = vec![
            text(5, Some(1), 1),
            section(1, None, 2),
            text(2, None, 0),
            text(4, Some(1), 0),
            section(3, Some(1), 5),
            text(6, Some(3), 0),
        ];

        let forest = build(&items).unwrap();

        assert_eq!(ids(&forest), vec![2, 1]);
        assert_eq!(ids(&forest[1].children), vec![4, 5, 3]);
        assert_eq!(ids(&forest[1].children[2].children), vec![6]);
        assert_eq!(count(&forest), 6);
    }

    #[test]
    fn test_build_orders_sort_order_ties_by_id() {
        let items = vec![text(9, None, 0), text(3, None, 0), text(5, None, 0)];
        let forest = build(&items).unwrap();
        assert_eq!(ids(&forest), vec![3, 5, 9]);
    }

    #[test]
    fn test_build_surfaces_missing_parent() {
        let items = vec![section(1, None, 0), text(2, Some(42), 0)];
        let err = build(&items).unwrap_err();
        assert_eq!(
            err.issues(),
            &[IntegrityIssue::MissingParent {
                id: MenuItemId(2),
                parent_id: MenuItemId(42)
            }]
        );
    }

    #[test]
    fn test_build_surfaces_cycle_once() {
        let items = vec![section(1, Some(3), 0), section(2, Some(1), 0), section(3, Some(2), 0), text(4, None, 0)];
        let err = build(&items).unwrap_err();
        assert_eq!(err.issues(), &[IntegrityIssue::Cycle { id: MenuItemId(1) }]);
    }

    #[test]
    fn test_build_surfaces_self_parent() {
        let items = vec![section(7, Some(7), 0)];
        let err = build(&items).unwrap_err();
        assert_eq!(err.issues(), &[IntegrityIssue::Cycle { id: MenuItemId(7) }]);
    }

    #[test]
    fn test_build_rejects_children_under_leaf() {
        let items = vec![text(1, None, 0), text(2, Some(1), 0)];
        let err = build(&items).unwrap_err();
        assert_eq!(
            err.issues(),
            &[IntegrityIssue::ChildOfLeaf {
                id: MenuItemId(2),
                parent_id: MenuItemId(1),
                parent_type: ItemType::Text
            }]
        );
    }

    #[test]
    fn test_build_rejects_duplicate_ids() {
        let items = vec![text(1, None, 0), text(1, None, 1)];
        let err = build(&items).unwrap_err();
        assert_eq!(err.issues(), &[IntegrityIssue::DuplicateId { id: MenuItemId(1) }]);
    }

    #[test]
    fn test_leaf_invariant_holds_for_built_trees() {
        let items = vec![
            section(1, None, 0),
            text(2, Some(1), 0),
            section(3, Some(1), 1),
            text(4, Some(3), 0),
            MenuItem::new(
                5,
                None,
                ItemKind::System {
                    action: SystemAction::Tariffs,
                },
                "Тарифы",
            ),
        ];
        let forest = build(&items).unwrap();

        fn check(level: &[MenuNode]) {
            for node in level {
                if !node.item.is_section() {
                    assert!(node.children.is_empty(), "leaf {} has children", node.id());
                }
                check(&node.children);
            }
        }
        check(&forest);
    }

    // ==================== integrity_report Tests ====================

    #[test]
    fn test_report_includes_duplicate_sort_orders_as_warnings() {
        let items = vec![text(1, None, 0), text(2, None, 0), section(3, None, 1), text(4, Some(3), 2), text(5, Some(3), 2)];
        let report = integrity_report(&items);
        assert_eq!(
            report,
            vec![
                IntegrityIssue::DuplicateSortOrder {
                    parent_id: None,
                    sort_order: 0
                },
                IntegrityIssue::DuplicateSortOrder {
                    parent_id: Some(MenuItemId(3)),
                    sort_order: 2
                },
            ]
        );
        assert!(report.iter().all(|issue| !issue.is_fatal()));
        assert!(build(&items).is_ok());
    }

    #[test]
    fn test_issue_display() {
        let issue = IntegrityIssue::MissingParent {
            id: MenuItemId(2),
            parent_id: MenuItemId(9),
        };
        assert_eq!(issue.to_string(), "item 2 references missing parent 9");
        let err = TreeError::Integrity(vec![issue, IntegrityIssue::Cycle { id: MenuItemId(4) }]);
        assert!(err.to_string().starts_with("2 integrity issue(s)"));
    }

    // ==================== flatten Tests ====================

    #[test]
    fn test_flatten_is_preorder_with_contiguous_sort_order() {
        let items = vec![section(1, None, 10), text(2, Some(1), 7), text(3, Some(1), 9), text(4, None, 20)];
        let flat = flatten(&build(&items).unwrap());

        let shape: Vec<(i64, Option<i64>, i32)> = flat
            .iter()
            .map(|item| (item.id.0, item.parent_id.map(|p| p.0), item.sort_order))
            .collect();
        assert_eq!(shape, vec![(1, None, 0), (2, Some(1), 0), (3, Some(1), 1), (4, None, 1)]);
    }

    #[test]
    fn test_round_trip_build_flatten() {
        let items = vec![
            section(1, None, 0),
            section(2, Some(1), 0),
            text(3, Some(2), 0),
            text(4, Some(2), 1),
            text(5, Some(1), 1),
            text(6, None, 1),
            section(7, None, 2),
        ];
        let tree = build(&items).unwrap();

        assert_eq!(build(&flatten(&tree)).unwrap(), tree);
    }

    #[test]
    fn test_round_trip_after_renumber_for_sparse_sort_orders() {
        let items = vec![text(1, None, 5), section(2, None, 40), text(3, Some(2), 7), text(4, Some(2), 3)];
        let mut tree = build(&items).unwrap();
        let before: Vec<Vec<i64>> = vec![ids(&tree), ids(&tree[1].children)];

        renumber(&mut tree);

        assert_eq!(build(&flatten(&tree)).unwrap(), tree);
        assert_eq!(vec![ids(&tree), ids(&tree[1].children)], before);
        assert_eq!(tree[1].children[1].item.sort_order, 1);
    }

    // ==================== lookup Tests ====================

    #[test]
    fn test_find_and_contains() {
        let items = vec![section(1, None, 0), section(2, Some(1), 0), text(3, Some(2), 0), text(4, None, 1)];
        let forest = build(&items).unwrap();

        assert_eq!(find(&forest, MenuItemId(3)).map(|n| n.id()), Some(MenuItemId(3)));
        assert!(find(&forest, MenuItemId(99)).is_none());
        assert!(forest[0].contains(MenuItemId(3)));
        assert!(!forest[0].contains(MenuItemId(4)));
        assert_eq!(forest[0].descendant_ids(), vec![MenuItemId(2), MenuItemId(3)]);
        assert_eq!(children_of(&forest, Some(MenuItemId(2))).map(ids), Some(vec![3]));
        assert_eq!(children_of(&forest, None).map(ids), Some(vec![1, 4]));
    }
}
