use clap::{Args, Parser, Subcommand};

use crate::menu::form::MenuItemDraft;
use crate::menu::model::{ItemType, Language, LanguageGate, MenuItemId, SystemAction, Visibility};

#[derive(Parser)]
#[command(name = "subadmin")]
#[command(author, version, about = "Menu configuration console for the subscription bot", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the editable menu outline
    Outline {
        /// Show only root items
        #[arg(long)]
        collapsed: bool,

        /// Load through the pre-built tree endpoint
        #[arg(long)]
        from_tree: bool,
    },

    /// Show what the bot renders for a given viewer
    Preview {
        /// Viewer language (ru, en)
        #[arg(short, long)]
        lang: Option<String>,

        /// Viewer has an active subscription
        #[arg(short, long)]
        subscribed: bool,

        /// Sections to enter first, comma separated ids (e.g. 3,7)
        #[arg(short, long)]
        path: Option<String>,

        /// Press this item's button on the resulting level
        #[arg(long)]
        press: Option<i64>,
    },

    /// Create a menu item
    Add {
        /// Item type (section, link, text, faq, system)
        #[arg(short = 't', long = "type")]
        item_type: ItemType,

        /// Parent section id (root when omitted)
        #[arg(long)]
        parent: Option<i64>,

        #[command(flatten)]
        fields: ItemArgs,
    },

    /// Edit an existing menu item
    Edit {
        id: i64,

        /// Change the item type
        #[arg(short = 't', long = "type")]
        item_type: Option<ItemType>,

        #[command(flatten)]
        fields: ItemArgs,
    },

    /// Move an item under another section and/or to another position
    Move {
        id: i64,

        /// Target section id (root when omitted)
        #[arg(long)]
        parent: Option<i64>,

        /// Position among the new siblings, 0-based (end when omitted)
        #[arg(long)]
        position: Option<usize>,
    },

    /// Rearrange one level, listing every sibling id in the new order
    Order {
        /// Section whose children are rearranged (root when omitted)
        #[arg(long)]
        parent: Option<i64>,

        #[arg(required = true, num_args = 1..)]
        ids: Vec<i64>,
    },

    /// Delete an item together with everything under it
    Delete {
        id: i64,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Create an inactive copy of an item
    Duplicate { id: i64 },

    /// List starter templates
    Templates,

    /// Replace the menu with a starter template
    ApplyTemplate {
        id: String,

        /// Add template items next to the existing menu instead of replacing it
        #[arg(long)]
        keep_existing: bool,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Report integrity problems in the stored menu
    Check,
}

/// Field overrides shared by `add` and `edit`.
#[derive(Args, Debug, Default)]
pub struct ItemArgs {
    /// Russian label
    #[arg(long)]
    pub text_ru: Option<String>,

    /// English label (falls back to Russian)
    #[arg(long)]
    pub text_en: Option<String>,

    /// Button icon (type glyph when empty)
    #[arg(long)]
    pub icon: Option<String>,

    /// URL, message text or FAQ id depending on type
    #[arg(long)]
    pub value: Option<String>,

    /// System action for system items
    #[arg(long)]
    pub action: Option<SystemAction>,

    /// all, subscribed, not_subscribed
    #[arg(long)]
    pub visibility: Option<Visibility>,

    /// all, ru, en
    #[arg(long)]
    pub language: Option<LanguageGate>,

    /// Explicit position among siblings
    #[arg(long)]
    pub sort_order: Option<i32>,

    /// Mark the item active
    #[arg(long, conflicts_with = "inactive")]
    pub active: bool,

    /// Mark the item inactive
    #[arg(long)]
    pub inactive: bool,
}

impl ItemArgs {
    /// Writes every given field into the draft, leaving the rest untouched.
    pub fn apply_to(&self, draft: &mut MenuItemDraft) {
        if let Some(text_ru) = &self.text_ru {
            draft.text_ru = text_ru.clone();
        }
        if let Some(text_en) = &self.text_en {
            draft.text_en = text_en.clone();
        }
        if let Some(icon) = &self.icon {
            draft.icon = icon.clone();
        }
        if let Some(value) = &self.value {
            draft.value = value.clone();
        }
        if self.action.is_some() {
            draft.system_action = self.action;
        }
        if let Some(visibility) = self.visibility {
            draft.visibility = visibility;
        }
        if let Some(language) = self.language {
            draft.visibility_language = language;
        }
        if self.sort_order.is_some() {
            draft.sort_order = self.sort_order;
        }
        if self.active {
            draft.is_active = true;
        }
        if self.inactive {
            draft.is_active = false;
        }
    }
}

/// Parses `"3,7"` into section ids; blanks are skipped.
pub fn parse_path(raw: &str) -> Result<Vec<MenuItemId>, std::num::ParseIntError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<i64>().map(MenuItemId))
        .collect()
}

/// Viewer language from a flag, falling back to the configured default.
pub fn preview_language(flag: Option<&str>, default: &str) -> Language {
    Language::from_code(flag.unwrap_or(default))
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add_command() {
        let cli = Cli::try_parse_from([
            "subadmin",
            "add",
            "--type",
            "system",
            "--text-ru",
            "Тарифы",
            "--action",
            "tariffs",
            "--visibility",
            "not_subscribed",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Add {
                item_type,
                parent,
                fields,
            }) => {
                assert_eq!(item_type, ItemType::System);
                assert_eq!(parent, None);
                assert_eq!(fields.action, Some(SystemAction::Tariffs));
                assert_eq!(fields.visibility, Some(Visibility::NotSubscribed));
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        assert!(Cli::try_parse_from(["subadmin", "add", "--type", "widget"]).is_err());
    }

    #[test]
    fn test_apply_to_overrides_given_fields_only() {
        let mut draft = MenuItemDraft::new(ItemType::Text, "Старое");
        draft.value = "body".into();
        let args = ItemArgs {
            text_ru: Some("Новое".into()),
            inactive: true,
            ..ItemArgs::default()
        };
        args.apply_to(&mut draft);

        assert_eq!(draft.text_ru, "Новое");
        assert_eq!(draft.value, "body");
        assert!(!draft.is_active);
    }

    #[test]
    fn test_parse_path() {
        assert_eq!(parse_path("3, 7,").unwrap(), vec![MenuItemId(3), MenuItemId(7)]);
        assert!(parse_path("").unwrap().is_empty());
        assert!(parse_path("x").is_err());
    }

    #[test]
    fn test_preview_language() {
        assert_eq!(preview_language(Some("en"), "ru"), Language::En);
        assert_eq!(preview_language(None, "en-US"), Language::En);
        assert_eq!(preview_language(None, "ru"), Language::Ru);
    }
}
