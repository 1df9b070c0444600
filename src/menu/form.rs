//! Menu item form: raw input, per-type validation, validated payload.
//!
//! [`MenuItemDraft`] mirrors what an operator types (free strings, a type
//! selector). [`MenuItemDraft::validate`] turns it into a
//! [`MenuItemPayload`] whose [`ItemKind`] already carries the right payload,
//! or returns every field problem at once.

use itertools::Itertools;
use strum::{AsRefStr, Display};
use thiserror::Error;
use url::Url;

use crate::core::config::limits;

use super::model::{ItemKind, ItemType, LanguageGate, MenuItem, MenuItemId, SystemAction, Visibility};

/// URL schemes accepted for `link` items.
pub const LINK_SCHEMES: &[&str] = &["http", "https", "tg"];

/// Form field names, as shown next to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum FormField {
    #[strum(serialize = "type")]
    ItemType,
    TextRu,
    TextEn,
    Icon,
    Value,
    SystemAction,
}

/// One field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("{0} is required")]
    Required(FormField),

    #[error("{field} is longer than {max} characters")]
    TooLong { field: FormField, max: usize },

    #[error("value is not an absolute URL: {0}")]
    InvalidUrl(String),

    #[error("unsupported URL scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("value must be a FAQ entry id, got '{0}'")]
    InvalidFaqRef(String),

    #[error("a section with {0} child item(s) cannot change its type")]
    SectionHasChildren(usize),
}

impl FieldError {
    pub fn field(&self) -> FormField {
        match self {
            FieldError::Required(field) | FieldError::TooLong { field, .. } => *field,
            FieldError::InvalidUrl(_) | FieldError::UnsupportedScheme(_) | FieldError::InvalidFaqRef(_) => {
                FormField::Value
            }
            FieldError::SectionHasChildren(_) => FormField::ItemType,
        }
    }
}

/// All problems found in one submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .0.iter().join("; "))]
pub struct FormErrors(pub Vec<FieldError>);

impl FormErrors {
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// Errors attached to one field, for inline display.
    pub fn for_field(&self, field: FormField) -> Vec<&FieldError> {
        self.0.iter().filter(|err| err.field() == field).collect()
    }
}

/// Raw form state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItemDraft {
    /// Set when editing an existing item.
    pub id: Option<MenuItemId>,
    pub parent_id: Option<MenuItemId>,
    pub item_type: ItemType,
    pub text_ru: String,
    pub text_en: String,
    pub icon: String,
    pub value: String,
    pub system_action: Option<SystemAction>,
    pub visibility: Visibility,
    pub visibility_language: LanguageGate,
    pub is_active: bool,
    pub sort_order: Option<i32>,
}

impl Default for MenuItemDraft {
    fn default() -> Self {
        Self {
            id: None,
            parent_id: None,
            item_type: ItemType::Link,
            text_ru: String::new(),
            text_en: String::new(),
            icon: String::new(),
            value: String::new(),
            system_action: None,
            visibility: Visibility::All,
            visibility_language: LanguageGate::All,
            is_active: true,
            sort_order: None,
        }
    }
}

impl MenuItemDraft {
    pub fn new(item_type: ItemType, text_ru: impl Into<String>) -> Self {
        Self {
            item_type,
            text_ru: text_ru.into(),
            ..Self::default()
        }
    }

    /// Pre-fills the form for editing.
    pub fn from_item(item: &MenuItem) -> Self {
        Self {
            id: Some(item.id),
            parent_id: item.parent_id,
            item_type: item.item_type(),
            text_ru: item.text_ru.clone(),
            text_en: item.text_en.clone().unwrap_or_default(),
            icon: item.icon.clone().unwrap_or_default(),
            value: item.kind.value().unwrap_or_default().to_string(),
            system_action: item.kind.system_action(),
            visibility: item.visibility,
            visibility_language: item.visibility_language,
            is_active: item.is_active,
            sort_order: Some(item.sort_order),
        }
    }

    /// Validates the draft.
    ///
    /// `context_parent` is the level the form was opened from; it is used
    /// only when the draft carries no parent of its own.
    pub fn validate(&self, context_parent: Option<MenuItemId>) -> Result<MenuItemPayload, FormErrors> {
        let mut errors = Vec::new();

        let text_ru = self.text_ru.trim();
        if text_ru.is_empty() {
            errors.push(FieldError::Required(FormField::TextRu));
        }
        check_length(&mut errors, FormField::TextRu, text_ru, limits::TEXT_MAX_CHARS);

        let text_en = self.text_en.trim();
        check_length(&mut errors, FormField::TextEn, text_en, limits::TEXT_MAX_CHARS);

        let icon = self.icon.trim();
        check_length(&mut errors, FormField::Icon, icon, limits::ICON_MAX_CHARS);

        let value = self.value.trim();
        let kind = match self.item_type {
            ItemType::Section => Some(ItemKind::Section),
            ItemType::Link => validate_link(value)
                .map_err(|err| errors.push(err))
                .ok()
                .map(|url| ItemKind::Link { url }),
            ItemType::Text if value.is_empty() => {
                errors.push(FieldError::Required(FormField::Value));
                None
            }
            ItemType::Text => Some(ItemKind::Text {
                body: value.to_string(),
            }),
            ItemType::Faq => validate_faq_ref(value)
                .map_err(|err| errors.push(err))
                .ok()
                .map(|faq_ref| ItemKind::Faq { faq_ref }),
            ItemType::System => match self.system_action {
                Some(action) => Some(ItemKind::System { action }),
                None => {
                    errors.push(FieldError::Required(FormField::SystemAction));
                    None
                }
            },
        };

        match kind {
            Some(kind) if errors.is_empty() => Ok(MenuItemPayload {
                parent_id: self.parent_id.or(context_parent),
                icon: if icon.is_empty() {
                    kind.item_type().default_icon().to_string()
                } else {
                    icon.to_string()
                },
                kind,
                text_ru: text_ru.to_string(),
                text_en: (!text_en.is_empty()).then(|| text_en.to_string()),
                visibility: self.visibility,
                visibility_language: self.visibility_language,
                is_active: self.is_active,
                sort_order: self.sort_order,
            }),
            _ => Err(FormErrors(errors)),
        }
    }
}

fn check_length(errors: &mut Vec<FieldError>, field: FormField, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.push(FieldError::TooLong { field, max });
    }
}

fn validate_link(value: &str) -> Result<String, FieldError> {
    if value.is_empty() {
        return Err(FieldError::Required(FormField::Value));
    }
    let url = Url::parse(value).map_err(|_| FieldError::InvalidUrl(value.to_string()))?;
    if !LINK_SCHEMES.contains(&url.scheme()) {
        return Err(FieldError::UnsupportedScheme(url.scheme().to_string()));
    }
    if url.scheme() != "tg" && url.host_str().map_or(true, str::is_empty) {
        return Err(FieldError::InvalidUrl(value.to_string()));
    }
    Ok(value.to_string())
}

/// Only the shape is checked here; whether the entry exists is up to the backend.
fn validate_faq_ref(value: &str) -> Result<String, FieldError> {
    if value.is_empty() {
        return Err(FieldError::Required(FormField::Value));
    }
    match value.parse::<i64>() {
        Ok(id) if id > 0 => Ok(value.to_string()),
        _ => Err(FieldError::InvalidFaqRef(value.to_string())),
    }
}

/// A validated item ready to be created or updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItemPayload {
    pub parent_id: Option<MenuItemId>,
    pub kind: ItemKind,
    pub text_ru: String,
    pub text_en: Option<String>,
    pub icon: String,
    pub visibility: Visibility,
    pub visibility_language: LanguageGate,
    pub is_active: bool,
    /// `None` lets the caller append after the existing siblings.
    pub sort_order: Option<i32>,
}

impl MenuItemPayload {
    pub fn into_item(self, id: MenuItemId, sort_order: i32) -> MenuItem {
        MenuItem {
            id,
            parent_id: self.parent_id,
            kind: self.kind,
            text_ru: self.text_ru,
            text_en: self.text_en,
            icon: Some(self.icon),
            visibility: self.visibility,
            visibility_language: self.visibility_language,
            is_active: self.is_active,
            sort_order: self.sort_order.unwrap_or(sort_order),
        }
    }
}
