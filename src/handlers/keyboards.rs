//! Inline keyboard builders
//!
//! Renders the transport-independent `KeyboardKind` descriptors (and the
//! per-product card keyboards) into Telegram inline keyboards. Callback
//! data uses `namespace:value` tokens decoded back by the router.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use crate::i18n::I18n;
use crate::models::event::KeyboardKind;
use crate::models::product::Product;
use crate::utils::helpers::truncate_text;

/// Countries offered during onboarding and in settings
const COUNTRIES: [(&str, &str); 10] = [
    ("🇺🇦 Ukraine", "Ukraine"),
    ("🇵🇱 Poland", "Poland"),
    ("🇩🇪 Germany", "Germany"),
    ("🇫🇷 France", "France"),
    ("🇪🇸 Spain", "Spain"),
    ("🇮🇹 Italy", "Italy"),
    ("🇨🇿 Czechia", "Czechia"),
    ("🇷🇴 Romania", "Romania"),
    ("🇬🇧 UK", "UK"),
    ("🇺🇸 USA", "USA"),
];

const LANGUAGES: [(&str, &str); 3] = [
    ("🇬🇧 English", "en"),
    ("🇺🇦 Українська", "uk"),
    ("🇩🇪 Deutsch", "de"),
];

/// Render a keyboard descriptor, or None for `KeyboardKind::None`
pub fn render(kind: &KeyboardKind, i18n: &I18n, lang: &str) -> Option<InlineKeyboardMarkup> {
    match kind {
        KeyboardKind::None => None,
        KeyboardKind::CountrySelect => Some(country_keyboard()),
        KeyboardKind::LanguageSelect => Some(language_keyboard()),
        KeyboardKind::MainMenu => Some(main_menu(i18n, lang)),
        KeyboardKind::SettingsMenu { notifications_enabled } => {
            Some(settings_menu(i18n, lang, *notifications_enabled))
        }
        KeyboardKind::RecentSearches(entries) => Some(recent_searches(entries)),
    }
}

pub fn country_keyboard() -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = COUNTRIES
        .chunks(2)
        .map(|pair| {
            pair.iter()
                .map(|(label, name)| {
                    InlineKeyboardButton::callback(label.to_string(), format!("country:{}", name))
                })
                .collect()
        })
        .collect();

    InlineKeyboardMarkup::new(rows)
}

pub fn language_keyboard() -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = LANGUAGES
        .chunks(2)
        .map(|pair| {
            pair.iter()
                .map(|(label, code)| {
                    InlineKeyboardButton::callback(label.to_string(), format!("lang:{}", code))
                })
                .collect()
        })
        .collect();

    InlineKeyboardMarkup::new(rows)
}

pub fn main_menu(i18n: &I18n, lang: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            i18n.t("buttons.search", lang, None),
            "action:search",
        )],
        vec![
            InlineKeyboardButton::callback(i18n.t("buttons.top10", lang, None), "action:top10"),
            InlineKeyboardButton::callback(i18n.t("buttons.best_price", lang, None), "action:best_price"),
        ],
        vec![
            InlineKeyboardButton::callback(i18n.t("buttons.favorites", lang, None), "action:favorites"),
            InlineKeyboardButton::callback(i18n.t("buttons.settings", lang, None), "action:settings"),
        ],
    ])
}

pub fn settings_menu(i18n: &I18n, lang: &str, notifications_enabled: bool) -> InlineKeyboardMarkup {
    let toggle_label = if notifications_enabled {
        i18n.t("buttons.notifications_off", lang, None)
    } else {
        i18n.t("buttons.notifications_on", lang, None)
    };

    InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback(i18n.t("buttons.change_country", lang, None), "settings:country"),
            InlineKeyboardButton::callback(i18n.t("buttons.change_language", lang, None), "settings:language"),
        ],
        vec![InlineKeyboardButton::callback(toggle_label, "toggle:notifications")],
    ])
}

pub fn recent_searches(entries: &[(i64, String)]) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = entries
        .iter()
        .map(|(id, query)| {
            vec![InlineKeyboardButton::callback(
                format!("🔁 {}", truncate_text(query, 30)),
                format!("repeat:{}", id),
            )]
        })
        .collect();

    InlineKeyboardMarkup::new(rows)
}

/// Keyboard attached to one product card: buy link plus favorite toggle
pub fn product_keyboard(product: &Product, i18n: &I18n, lang: &str) -> InlineKeyboardMarkup {
    let mut row = Vec::new();

    if let Ok(buy_url) = url::Url::parse(&product.affiliate_url) {
        row.push(InlineKeyboardButton::url(i18n.t("buttons.buy", lang, None), buy_url));
    }
    row.push(InlineKeyboardButton::callback(
        i18n.t("buttons.like", lang, None),
        format!("fav:{}", product.id),
    ));

    InlineKeyboardMarkup::new(vec![row])
}

/// Single "show more" row appended after a paged result list
pub fn more_keyboard(i18n: &I18n, lang: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        i18n.t("buttons.more", lang, None),
        "more:next",
    )]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_keyboard_rows() {
        let keyboard = country_keyboard();
        assert_eq!(keyboard.inline_keyboard.len(), 5);
        let first = &keyboard.inline_keyboard[0][0];
        assert_eq!(first.text, "🇺🇦 Ukraine");
    }

    #[test]
    fn test_recent_searches_truncates_labels() {
        let entries = vec![(7, "a very long query that goes on and on forever".to_string())];
        let keyboard = recent_searches(&entries);
        assert_eq!(keyboard.inline_keyboard.len(), 1);
        assert!(keyboard.inline_keyboard[0][0].text.len() < 40);
    }
}
