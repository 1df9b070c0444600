//! Menu item domain types.
//!
//! `type`, `system_action`, `visibility` and `visibility_language` are closed
//! enums here; the polymorphic `value` lives inside [`ItemKind`] so a `faq`
//! item with a system action (or a `system` item without one) cannot be built.

use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Stable identifier of a menu item, assigned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MenuItemId(pub i64);

impl fmt::Display for MenuItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for MenuItemId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

/// Item type tag as stored by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ItemType {
    Section,
    Link,
    Text,
    Faq,
    System,
}

impl ItemType {
    /// Glyph used when an item carries no icon of its own.
    pub fn default_icon(self) -> &'static str {
        match self {
            ItemType::Section => "📁",
            ItemType::Link => "🔗",
            ItemType::Text => "💬",
            ItemType::Faq => "❓",
            ItemType::System => "⚙️",
        }
    }

    /// Label shown in the editor outline.
    pub fn label_ru(self) -> &'static str {
        match self {
            ItemType::Section => "Раздел",
            ItemType::Link => "Ссылка",
            ItemType::Text => "Текст",
            ItemType::Faq => "FAQ",
            ItemType::System => "Система",
        }
    }
}

/// Built-in bot actions a `system` item can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SystemAction {
    Tariffs,
    Subscriptions,
    Language,
    Support,
    Promocode,
}

impl SystemAction {
    pub fn label_ru(self) -> &'static str {
        match self {
            SystemAction::Tariffs => "Тарифы",
            SystemAction::Subscriptions => "Подписки",
            SystemAction::Language => "Язык",
            SystemAction::Support => "Поддержка",
            SystemAction::Promocode => "Промокод",
        }
    }
}

/// Subscription-state gate.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Visibility {
    #[default]
    All,
    Subscribed,
    NotSubscribed,
}

/// Language gate.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LanguageGate {
    #[default]
    All,
    Ru,
    En,
}

impl LanguageGate {
    pub fn admits(self, language: Language) -> bool {
        match self {
            LanguageGate::All => true,
            LanguageGate::Ru => language == Language::Ru,
            LanguageGate::En => language == Language::En,
        }
    }
}

/// Language of the bot user viewing the menu.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Language {
    #[default]
    Ru,
    En,
}

impl Language {
    /// Normalizes a language code ("en", "en-US", "RU") into a viewer language.
    /// Unknown codes fall back to Russian, like the bot does.
    pub fn from_code(code: &str) -> Self {
        let base = code.split(['-', '_']).next().unwrap_or(code).trim().to_ascii_lowercase();
        match base.as_str() {
            "en" => Language::En,
            _ => Language::Ru,
        }
    }
}

/// Type tag together with its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    /// Submenu; the only kind that may have children.
    Section,
    /// External link, opened by the client.
    Link { url: String },
    /// Message sent when the button is pressed.
    Text { body: String },
    /// Reference to a FAQ entry id (kept as the raw stored string).
    Faq { faq_ref: String },
    /// Built-in bot action.
    System { action: SystemAction },
}

impl ItemKind {
    pub fn item_type(&self) -> ItemType {
        match self {
            ItemKind::Section => ItemType::Section,
            ItemKind::Link { .. } => ItemType::Link,
            ItemKind::Text { .. } => ItemType::Text,
            ItemKind::Faq { .. } => ItemType::Faq,
            ItemKind::System { .. } => ItemType::System,
        }
    }

    /// The stored `value` column for this kind, `None` when unused or empty.
    pub fn value(&self) -> Option<&str> {
        let raw = match self {
            ItemKind::Link { url } => url.as_str(),
            ItemKind::Text { body } => body.as_str(),
            ItemKind::Faq { faq_ref } => faq_ref.as_str(),
            ItemKind::Section | ItemKind::System { .. } => return None,
        };
        (!raw.is_empty()).then_some(raw)
    }

    pub fn system_action(&self) -> Option<SystemAction> {
        match self {
            ItemKind::System { action } => Some(*action),
            _ => None,
        }
    }
}

/// One node of the bot menu, as persisted (children are never stored).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub id: MenuItemId,
    pub parent_id: Option<MenuItemId>,
    pub kind: ItemKind,
    pub text_ru: String,
    pub text_en: Option<String>,
    pub icon: Option<String>,
    pub visibility: Visibility,
    pub visibility_language: LanguageGate,
    pub is_active: bool,
    pub sort_order: i32,
}

impl MenuItem {
    /// A bare active item with default visibility, mostly useful for fixtures.
    pub fn new(id: i64, parent_id: Option<i64>, kind: ItemKind, text_ru: impl Into<String>) -> Self {
        Self {
            id: MenuItemId(id),
            parent_id: parent_id.map(MenuItemId),
            kind,
            text_ru: text_ru.into(),
            text_en: None,
            icon: None,
            visibility: Visibility::All,
            visibility_language: LanguageGate::All,
            is_active: true,
            sort_order: 0,
        }
    }

    pub fn item_type(&self) -> ItemType {
        self.kind.item_type()
    }

    pub fn is_section(&self) -> bool {
        matches!(self.kind, ItemKind::Section)
    }

    /// Label in the given language; English falls back to `text_ru`.
    pub fn label(&self, language: Language) -> &str {
        match language {
            Language::Ru => &self.text_ru,
            Language::En => self
                .text_en
                .as_deref()
                .filter(|text| !text.is_empty())
                .unwrap_or(&self.text_ru),
        }
    }

    /// Icon shown in the editor: own icon or the type glyph.
    pub fn display_icon(&self) -> &str {
        self.icon
            .as_deref()
            .filter(|icon| !icon.is_empty())
            .unwrap_or_else(|| self.item_type().default_icon())
    }

    /// Button caption exactly as the bot builds it: `"<icon> <label>"`, or the
    /// bare label when the item has no icon.
    pub fn button_text(&self, language: Language) -> String {
        match self.icon.as_deref().filter(|icon| !icon.is_empty()) {
            Some(icon) => format!("{} {}", icon, self.label(language)),
            None => self.label(language).to_string(),
        }
    }
}
