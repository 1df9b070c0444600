//! Bot-side menu traversal for the live preview.
//!
//! The navigator keeps a stack of entered sections over a borrowed forest and
//! renders each level exactly as the bot does: one button per row, link items
//! with a value become URL buttons, a back button inside sections, and the
//! static main menu when a level has nothing visible.

use crate::i18n;

use super::model::{ItemKind, Language, MenuItemId, SystemAction};
use super::tree::MenuNode;
use super::visibility::{self, ViewerContext};

/// Prefix of callbacks that open a stored menu item.
pub const ITEM_CALLBACK_PREFIX: &str = "menu_item:";
/// Prefix of the back button callback, followed by the current section id.
pub const BACK_CALLBACK_PREFIX: &str = "menu_back:";

/// What tapping a rendered button does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    Callback(String),
    Url(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotButton {
    pub text: String,
    pub action: ButtonAction,
}

impl BotButton {
    fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action: ButtonAction::Callback(data.into()),
        }
    }
}

/// One rendered bot message: title plus a single-column keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotScreen {
    pub title: String,
    pub buttons: Vec<BotButton>,
    /// True when the level was empty and the static main menu was shown.
    pub is_fallback: bool,
}

/// Result of pressing a stored item's button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PressOutcome {
    /// A section was opened; the navigator moved into it.
    Entered(MenuItemId),
    /// The client opens the URL itself.
    OpenUrl(String),
    /// A text message is shown (`"..."` when the item has no body).
    ShowText(String),
    /// A FAQ entry is shown; `None` when the reference is not a number.
    ShowFaq(Option<i64>),
    /// A built-in bot screen is opened.
    RunSystemAction(SystemAction),
    /// The button does nothing (link without a URL, or not on this level).
    Nothing,
}

/// Path-stack navigator over a borrowed forest.
#[derive(Debug, Clone)]
pub struct MenuNavigator<'a> {
    forest: &'a [MenuNode],
    context: ViewerContext,
    path: Vec<&'a MenuNode>,
}

impl<'a> MenuNavigator<'a> {
    pub fn new(forest: &'a [MenuNode], context: ViewerContext) -> Self {
        Self {
            forest,
            context,
            path: Vec::new(),
        }
    }

    pub fn context(&self) -> ViewerContext {
        self.context
    }

    /// Switching the viewer keeps the current path; the preview re-renders it.
    pub fn set_context(&mut self, context: ViewerContext) {
        self.context = context;
    }

    /// Sections entered so far, outermost first.
    pub fn path(&self) -> &[&'a MenuNode] {
        &self.path
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }

    pub fn is_at_root(&self) -> bool {
        self.path.is_empty()
    }

    /// Section currently shown, `None` at root.
    pub fn current_section(&self) -> Option<&'a MenuNode> {
        self.path.last().copied()
    }

    fn current_level(&self) -> &'a [MenuNode] {
        match self.path.last() {
            Some(section) => &section.children,
            None => self.forest,
        }
    }

    /// Visible items of the current level, in display order.
    pub fn current_items(&self) -> Vec<&'a MenuNode> {
        visibility::visible(self.current_level(), &self.context)
    }

    /// Opens a section shown on the current level.
    ///
    /// Non-sections, and sections the viewer cannot see here, are rejected
    /// and leave the path unchanged.
    pub fn enter(&mut self, item: &MenuNode) -> bool {
        if !item.item.is_section() {
            return false;
        }
        match self.current_items().into_iter().find(|node| node.id() == item.id()) {
            Some(node) => {
                self.path.push(node);
                true
            }
            None => false,
        }
    }

    /// Like [`enter`](Self::enter) but addressed by id.
    pub fn enter_by_id(&mut self, id: MenuItemId) -> bool {
        match self.current_items().into_iter().find(|node| node.id() == id) {
            Some(node) => self.enter(node),
            None => false,
        }
    }

    /// Leaves the current section; no-op at root.
    pub fn back(&mut self) {
        self.path.pop();
    }

    pub fn reset(&mut self) {
        self.path.clear();
    }

    /// Message text the bot puts above the keyboard.
    pub fn title(&self) -> String {
        match self.current_section() {
            Some(section) if !self.current_items().is_empty() => {
                format!("📁 {}", section.item.label(self.context.language))
            }
            _ => i18n::t(self.context.language, "menu-title"),
        }
    }

    /// Renders the current level as the bot would send it.
    pub fn screen(&self) -> BotScreen {
        let language = self.context.language;
        let items = self.current_items();
        if items.is_empty() {
            return BotScreen {
                title: i18n::t(language, "menu-title"),
                buttons: static_main_menu(language, self.context.has_active_subscription),
                is_fallback: true,
            };
        }

        let mut buttons: Vec<BotButton> = items.iter().map(|node| item_button(node, language)).collect();
        if let Some(section) = self.current_section() {
            buttons.push(BotButton::callback(
                format!("◀️ {}", i18n::t(language, "menu-back")),
                format!("{}{}", BACK_CALLBACK_PREFIX, section.id()),
            ));
        }

        BotScreen {
            title: self.title(),
            buttons,
            is_fallback: false,
        }
    }

    /// Presses the button of `item` on the current level.
    pub fn press(&mut self, item: &MenuNode) -> PressOutcome {
        let Some(node) = self.current_items().into_iter().find(|node| node.id() == item.id()) else {
            return PressOutcome::Nothing;
        };
        match &node.item.kind {
            ItemKind::Section => {
                self.path.push(node);
                PressOutcome::Entered(node.id())
            }
            ItemKind::Link { url } if !url.is_empty() => PressOutcome::OpenUrl(url.clone()),
            ItemKind::Link { .. } => PressOutcome::Nothing,
            ItemKind::Text { body } if body.is_empty() => {
                PressOutcome::ShowText(i18n::t(self.context.language, "menu-empty-text"))
            }
            ItemKind::Text { body } => PressOutcome::ShowText(body.clone()),
            ItemKind::Faq { faq_ref } => PressOutcome::ShowFaq(faq_ref.trim().parse().ok()),
            ItemKind::System { action } => PressOutcome::RunSystemAction(*action),
        }
    }

    /// Presses by id; unknown or hidden ids do nothing.
    pub fn press_id(&mut self, id: MenuItemId) -> PressOutcome {
        match self.current_items().into_iter().find(|node| node.id() == id) {
            Some(node) => self.press(node),
            None => PressOutcome::Nothing,
        }
    }
}

fn item_button(node: &MenuNode, language: Language) -> BotButton {
    let text = node.item.button_text(language);
    match &node.item.kind {
        ItemKind::Link { url } if !url.is_empty() => BotButton {
            text,
            action: ButtonAction::Url(url.clone()),
        },
        _ => BotButton::callback(text, format!("{}{}", ITEM_CALLBACK_PREFIX, node.id())),
    }
}

/// Hard-coded keyboard the bot falls back to when a level is empty.
pub fn static_main_menu(language: Language, has_active_subscription: bool) -> Vec<BotButton> {
    let mut buttons = Vec::with_capacity(5);
    if !has_active_subscription {
        buttons.push(BotButton::callback(i18n::t(language, "menu-tariffs"), "menu:tariffs"));
    }
    buttons.push(BotButton::callback(
        i18n::t(language, "menu-my-subscriptions"),
        "menu:my_subscriptions",
    ));
    buttons.push(BotButton::callback(i18n::t(language, "menu-promocode"), "menu:promocode"));
    buttons.push(BotButton::callback(i18n::t(language, "menu-language"), "menu:language"));
    buttons.push(BotButton::callback(i18n::t(language, "menu-support"), "menu:support"));
    buttons
}
