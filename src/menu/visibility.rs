//! Which items a given bot user sees.

use super::model::{Language, MenuItem, Visibility};
use super::tree::MenuNode;

/// Who is looking at the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewerContext {
    pub language: Language,
    pub has_active_subscription: bool,
}

impl ViewerContext {
    pub fn new(language: Language, has_active_subscription: bool) -> Self {
        Self {
            language,
            has_active_subscription,
        }
    }
}

/// An item is shown iff it is active, its language gate admits the viewer
/// language and its subscription gate matches the viewer state.
pub fn is_visible(item: &MenuItem, ctx: &ViewerContext) -> bool {
    if !item.is_active || !item.visibility_language.admits(ctx.language) {
        return false;
    }
    match item.visibility {
        Visibility::All => true,
        Visibility::Subscribed => ctx.has_active_subscription,
        Visibility::NotSubscribed => !ctx.has_active_subscription,
    }
}

/// Visible members of one sibling group, order preserved.
///
/// Only the given level is filtered; hidden sections hide their subtree
/// simply because they can never be entered.
pub fn visible<'a>(level: &'a [MenuNode], ctx: &ViewerContext) -> Vec<&'a MenuNode> {
    level.iter().filter(|node| is_visible(&node.item, ctx)).collect()
}
