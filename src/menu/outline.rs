//! Editable outline view-model.
//!
//! Expand/collapse state belongs to one editor session and is never written
//! back to the menu records.

use std::collections::HashSet;
use std::fmt;

use super::model::{ItemKind, MenuItemId, Visibility};
use super::tree::MenuNode;

/// Expanded sections of one editor session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutlineState {
    expanded: HashSet<MenuItemId>,
}

impl OutlineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, id: MenuItemId) -> bool {
        self.expanded.contains(&id)
    }

    /// Flips one section; returns the new state.
    pub fn toggle(&mut self, id: MenuItemId) -> bool {
        if !self.expanded.remove(&id) {
            self.expanded.insert(id);
            return true;
        }
        false
    }

    pub fn expand(&mut self, id: MenuItemId) {
        self.expanded.insert(id);
    }

    pub fn expand_all(&mut self, forest: &[MenuNode]) {
        for node in forest {
            if !node.children.is_empty() {
                self.expanded.insert(node.id());
            }
            self.expand_all(&node.children);
        }
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    /// Drops ids that no longer exist, e.g. after a reload.
    pub fn retain_existing(&mut self, forest: &[MenuNode]) {
        self.expanded
            .retain(|id| super::tree::find(forest, *id).is_some_and(|node| node.item.is_section()));
    }
}

/// One visible outline line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineRow {
    pub id: MenuItemId,
    pub depth: usize,
    pub glyph: String,
    pub label: String,
    pub type_label: String,
    /// Subscription gate, when it is not `all`.
    pub badge: Option<&'static str>,
    /// Inactive items are rendered dimmed.
    pub dimmed: bool,
    pub has_children: bool,
    pub expanded: bool,
}

impl fmt::Display for OutlineRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match (self.has_children, self.expanded) {
            (true, true) => "▾",
            (true, false) => "▸",
            (false, _) => " ",
        };
        write!(
            f,
            "{}{} {} {} [{}] #{}",
            "  ".repeat(self.depth),
            marker,
            self.glyph,
            self.label,
            self.type_label,
            self.id
        )?;
        if let Some(badge) = self.badge {
            write!(f, " ({})", badge)?;
        }
        if self.dimmed {
            write!(f, " (выкл.)")?;
        }
        Ok(())
    }
}

fn type_label(node: &MenuNode) -> String {
    match &node.item.kind {
        ItemKind::System { action } => format!("{}: {}", node.item.item_type().label_ru(), action.label_ru()),
        kind => kind.item_type().label_ru().to_string(),
    }
}

fn badge(visibility: Visibility) -> Option<&'static str> {
    match visibility {
        Visibility::All => None,
        Visibility::Subscribed => Some("подписчики"),
        Visibility::NotSubscribed => Some("без подписки"),
    }
}

/// Rows currently visible in the outline: every root item, plus children of
/// expanded sections, pre-order.
pub fn rows(forest: &[MenuNode], state: &OutlineState) -> Vec<OutlineRow> {
    let mut out = Vec::new();
    collect(forest, state, 0, &mut out);
    out
}

fn collect(level: &[MenuNode], state: &OutlineState, depth: usize, out: &mut Vec<OutlineRow>) {
    for node in level {
        let expanded = state.is_expanded(node.id());
        out.push(OutlineRow {
            id: node.id(),
            depth,
            glyph: node.item.display_icon().to_string(),
            label: node.item.text_ru.clone(),
            type_label: type_label(node),
            badge: badge(node.item.visibility),
            dimmed: !node.item.is_active,
            has_children: !node.children.is_empty(),
            expanded,
        });
        if expanded {
            collect(&node.children, state, depth + 1, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::model::{MenuItem, SystemAction};
    use crate::menu::tree;
    use pretty_assertions::assert_eq;

    fn forest() -> Vec<MenuNode> {
        let mut hidden = MenuItem::new(3, Some(1), ItemKind::Text { body: "x".into() }, "Скрыто");
        hidden.is_active = false;
        hidden.visibility = Visibility::Subscribed;
        let mut system = MenuItem::new(
            2,
            None,
            ItemKind::System {
                action: SystemAction::Tariffs,
            },
            "Тарифы",
        );
        system.sort_order = 1;
        tree::build(&[MenuItem::new(1, None, ItemKind::Section, "Раздел"), system, hidden]).unwrap()
    }

    #[test]
    fn test_collapsed_outline_shows_roots_only() {
        let forest = forest();
        let rows = rows(&forest, &OutlineState::new());
        let ids: Vec<i64> = rows.iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(rows[1].type_label, "Система: Тарифы");
        assert_eq!(rows[0].to_string(), "▸ 📁 Раздел [Раздел] #1");
    }

    #[test]
    fn test_expanded_section_shows_children() {
        let forest = forest();
        let mut state = OutlineState::new();
        assert!(state.toggle(MenuItemId(1)));
        let rows = rows(&forest, &state);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].depth, 1);
        assert!(rows[1].dimmed);
        assert_eq!(rows[1].to_string(), "    💬 Скрыто [Текст] #3 (подписчики) (выкл.)");

        assert!(!state.toggle(MenuItemId(1)));
        assert_eq!(super::rows(&forest, &state).len(), 2);
    }

    #[test]
    fn test_expand_all_and_retain() {
        let forest = forest();
        let mut state = OutlineState::new();
        state.expand_all(&forest);
        assert!(state.is_expanded(MenuItemId(1)));
        assert!(!state.is_expanded(MenuItemId(2)));

        state.expand(MenuItemId(99));
        state.retain_existing(&forest);
        assert!(!state.is_expanded(MenuItemId(99)));

        state.collapse_all();
        assert!(!state.is_expanded(MenuItemId(1)));
    }
}
