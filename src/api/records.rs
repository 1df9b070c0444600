//! Wire shapes of the admin backend.
//!
//! Records are decoded as-is and converted into domain types afterwards, so a
//! malformed row fails with a precise [`RecordError`] instead of a generic
//! JSON error.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::menu::form::MenuItemPayload;
use crate::menu::model::{
    ItemKind, ItemType, Language, LanguageGate, MenuItem, MenuItemId, SystemAction, Visibility,
};
use crate::menu::reorder::ReorderEntry;

/// A record that decoded but cannot be a menu item.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("system item {0} has no system_action")]
    MissingSystemAction(MenuItemId),

    #[error("item {0} has an empty text_ru")]
    MissingLabel(MenuItemId),
}

fn default_true() -> bool {
    true
}

/// Empty strings are what the admin form stores for "no value".
fn empty_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|value| !value.is_empty()))
}

fn empty_action_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<SystemAction>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// One flat menu row as the backend sends it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MenuItemRecord {
    pub id: MenuItemId,
    #[serde(default)]
    pub parent_id: Option<MenuItemId>,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    #[serde(default, deserialize_with = "empty_action_as_none")]
    pub system_action: Option<SystemAction>,
    pub text_ru: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub text_en: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub icon: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub value: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub visibility_language: LanguageGate,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl TryFrom<MenuItemRecord> for MenuItem {
    type Error = RecordError;

    fn try_from(record: MenuItemRecord) -> Result<Self, Self::Error> {
        if record.text_ru.trim().is_empty() {
            return Err(RecordError::MissingLabel(record.id));
        }
        let value = record.value.unwrap_or_default();
        let kind = match record.item_type {
            ItemType::Section => ItemKind::Section,
            ItemType::Link => ItemKind::Link { url: value },
            ItemType::Text => ItemKind::Text { body: value },
            ItemType::Faq => ItemKind::Faq { faq_ref: value },
            ItemType::System => ItemKind::System {
                action: record
                    .system_action
                    .ok_or(RecordError::MissingSystemAction(record.id))?,
            },
        };
        Ok(MenuItem {
            id: record.id,
            parent_id: record.parent_id,
            kind,
            text_ru: record.text_ru,
            text_en: record.text_en,
            icon: record.icon,
            visibility: record.visibility,
            visibility_language: record.visibility_language,
            is_active: record.is_active,
            sort_order: record.sort_order,
        })
    }
}

impl From<&MenuItem> for MenuItemRecord {
    fn from(item: &MenuItem) -> Self {
        Self {
            id: item.id,
            parent_id: item.parent_id,
            item_type: item.item_type(),
            system_action: item.kind.system_action(),
            text_ru: item.text_ru.clone(),
            text_en: item.text_en.clone(),
            icon: item.icon.clone(),
            value: item.kind.value().map(str::to_string),
            visibility: item.visibility,
            visibility_language: item.visibility_language,
            sort_order: item.sort_order,
            is_active: item.is_active,
        }
    }
}

/// Nested row of `GET /menu/tree`.
#[derive(Debug, Clone, Deserialize)]
pub struct TreeRecord {
    #[serde(flatten)]
    pub record: MenuItemRecord,
    #[serde(default)]
    pub children: Vec<TreeRecord>,
}

impl TreeRecord {
    /// Pre-order flattening that keeps the server's `parent_id`/`sort_order`.
    pub fn flatten_into(self, out: &mut Vec<MenuItemRecord>) {
        out.push(self.record);
        for child in self.children {
            child.flatten_into(out);
        }
    }
}

/// `GET /menu` answers either a bare array or `{items: [...]}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListEnvelope<T> {
    Bare(Vec<T>),
    Wrapped { items: Vec<T> },
}

impl<T> ListEnvelope<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            ListEnvelope::Bare(items) | ListEnvelope::Wrapped { items } => items,
        }
    }
}

/// Create/update body: the flat schema minus `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItemBody {
    pub parent_id: Option<MenuItemId>,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub system_action: Option<SystemAction>,
    pub text_ru: String,
    pub text_en: Option<String>,
    pub icon: Option<String>,
    pub value: Option<String>,
    pub visibility: Visibility,
    pub visibility_language: LanguageGate,
    pub sort_order: i32,
    pub is_active: bool,
}

impl From<&MenuItemPayload> for MenuItemBody {
    fn from(payload: &MenuItemPayload) -> Self {
        Self {
            parent_id: payload.parent_id,
            item_type: payload.kind.item_type(),
            system_action: payload.kind.system_action(),
            text_ru: payload.text_ru.clone(),
            text_en: payload.text_en.clone(),
            icon: Some(payload.icon.clone()),
            value: payload.kind.value().map(str::to_string),
            visibility: payload.visibility,
            visibility_language: payload.visibility_language,
            sort_order: payload.sort_order.unwrap_or(0),
            is_active: payload.is_active,
        }
    }
}

/// `POST /menu/reorder` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderBody {
    pub items: Vec<ReorderEntry>,
}

/// Starter menu offered by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description_ru: Option<String>,
    #[serde(default)]
    pub description_en: Option<String>,
    #[serde(default)]
    pub items_count: usize,
}

impl MenuTemplate {
    pub fn description(&self, language: Language) -> Option<&str> {
        match language {
            Language::Ru => self.description_ru.as_deref(),
            Language::En => self.description_en.as_deref().or(self.description_ru.as_deref()),
        }
    }
}

/// Result of applying a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateApplied {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub items_created: usize,
}

/// FAQ entry a `faq` item can point at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub id: i64,
    pub question_ru: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub question_en: Option<String>,
    pub answer_ru: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub answer_en: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl FaqEntry {
    pub fn question(&self, language: Language) -> &str {
        match language {
            Language::Ru => &self.question_ru,
            Language::En => self.question_en.as_deref().unwrap_or(&self.question_ru),
        }
    }

    pub fn answer(&self, language: Language) -> &str {
        match language {
            Language::Ru => &self.answer_ru,
            Language::En => self.answer_en.as_deref().unwrap_or(&self.answer_ru),
        }
    }

    /// Message the bot sends for this entry.
    pub fn bot_message(&self, language: Language) -> String {
        format!("❓ {}\n\n{}", self.question(language), self.answer(language))
    }
}

/// One page of `GET /faq`.
#[derive(Debug, Clone, Deserialize)]
pub struct FaqPage {
    pub items: Vec<FaqEntry>,
    #[serde(default)]
    pub total: u64,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub per_page: u32,
    #[serde(default = "first_page")]
    pub pages: u32,
}

fn first_page() -> u32 {
    1
}
