use fluent_templates::{static_loader, Loader};
use once_cell::sync::Lazy;
use unic_langid::LanguageIdentifier;

use crate::menu::model::Language;

static_loader! {
    static LOCALES = {
        locales: "./locales",
        fallback_language: "ru",
    };
}

/// Default language identifier used as a fallback.
static DEFAULT_LANG: Lazy<LanguageIdentifier> = Lazy::new(|| "ru".parse().unwrap_or_default());

static EN_LANG: Lazy<LanguageIdentifier> = Lazy::new(|| "en-US".parse().unwrap_or_default());

/// Maps a viewer language onto the locale directory that serves it.
pub fn lang_id(language: Language) -> &'static LanguageIdentifier {
    match language {
        Language::Ru => &DEFAULT_LANG,
        Language::En => &EN_LANG,
    }
}

/// Returns a localized string for the given key.
/// Missing keys fall back to Russian, then to the key itself.
pub fn t(language: Language, key: &str) -> String {
    LOCALES
        .lookup(lang_id(language), key)
        .unwrap_or_else(|| LOCALES.lookup(&DEFAULT_LANG, key).unwrap_or_else(|| key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_strings_are_localized() {
        assert_eq!(t(Language::En, "menu-title"), "📱 Main Menu");
        assert_eq!(t(Language::Ru, "menu-title"), "📱 Главное меню");
        assert_eq!(t(Language::En, "menu-back"), "Back");
    }

    #[test]
    fn test_unknown_key_returns_key() {
        assert_eq!(t(Language::En, "no-such-key"), "no-such-key");
    }
}
