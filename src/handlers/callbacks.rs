//! Callback query handlers
//!
//! Button presses arrive as `namespace:value` tokens. They are decoded into
//! a typed `CallbackAction` at the router boundary; unknown namespaces
//! decode to `Unknown` and yield a no-op response reusing the current menu,
//! never a fallthrough string comparison deeper in the handlers.

use tracing::{info, warn};
use crate::handlers::{menu_response, search, AppContext};
use crate::models::event::{ChatEvent, KeyboardKind, Response};
use crate::models::favorite::NewFavorite;
use crate::models::user::UserProfile;
use crate::state::SearchSession;
use crate::utils::errors::Result;

/// Typed decoding of one callback payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    Country(String),
    Language(String),
    Menu(MenuAction),
    Settings(SettingsTarget),
    ToggleNotifications,
    Favorite(String),
    More,
    Repeat(i64),
    Noop,
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Search,
    TopTen,
    BestPrice,
    Favorites,
    Settings,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsTarget {
    Country,
    Language,
}

impl CallbackAction {
    /// Decode a `namespace:value` token
    pub fn parse(data: &str) -> Self {
        let (namespace, value) = match data.split_once(':') {
            Some((ns, value)) => (ns, value),
            None if data == "noop" => return CallbackAction::Noop,
            None => return CallbackAction::Unknown(data.to_string()),
        };

        match namespace {
            "country" => CallbackAction::Country(value.to_string()),
            "lang" => CallbackAction::Language(value.to_string()),
            "action" => match value {
                "search" => CallbackAction::Menu(MenuAction::Search),
                "top10" => CallbackAction::Menu(MenuAction::TopTen),
                "best_price" => CallbackAction::Menu(MenuAction::BestPrice),
                "favorites" => CallbackAction::Menu(MenuAction::Favorites),
                "settings" => CallbackAction::Menu(MenuAction::Settings),
                "help" => CallbackAction::Menu(MenuAction::Help),
                _ => CallbackAction::Unknown(data.to_string()),
            },
            "settings" => match value {
                "country" => CallbackAction::Settings(SettingsTarget::Country),
                "language" => CallbackAction::Settings(SettingsTarget::Language),
                _ => CallbackAction::Unknown(data.to_string()),
            },
            "toggle" => CallbackAction::ToggleNotifications,
            "fav" | "like" => CallbackAction::Favorite(value.to_string()),
            "more" => CallbackAction::More,
            "repeat" => match value.parse::<i64>() {
                Ok(id) => CallbackAction::Repeat(id),
                Err(_) => CallbackAction::Unknown(data.to_string()),
            },
            "noop" => CallbackAction::Noop,
            _ => CallbackAction::Unknown(data.to_string()),
        }
    }
}

/// Country selection. The only callback allowed before a profile has a
/// country; registers the profile on the fly when missing.
pub async fn handle_country(event: &ChatEvent, country: &str, ctx: &AppContext) -> Result<Response> {
    let (profile, _created) = ctx.services.user_service
        .register_or_get(
            event.user_id,
            None,
            event.display_name.clone(),
            event.locale.as_deref(),
        )
        .await?;

    let updated = ctx.services.user_service.set_country(event.user_id, country).await?;
    info!(user_id = profile.id, country = %country, "Country selected");

    let mut params = std::collections::HashMap::new();
    params.insert("country".to_string(), updated.country.clone());
    params.insert("currency".to_string(), updated.currency.clone());

    let text = ctx.i18n.t("settings.country_saved", &updated.language, Some(&params));
    Ok(Response::with_keyboard(text, KeyboardKind::MainMenu).in_locale(updated.language))
}

/// Everything except country selection; the router has already resolved
/// a profile with a chosen country.
pub async fn handle(
    action: CallbackAction,
    event: &ChatEvent,
    profile: &UserProfile,
    ctx: &AppContext,
) -> Result<Response> {
    let lang = profile.language.clone();

    match action {
        CallbackAction::Country(country) => handle_country(event, &country, ctx).await,

        CallbackAction::Language(code) => {
            match ctx.services.user_service.set_language(event.user_id, &code).await {
                Ok(updated) => {
                    let text = ctx.i18n.t("settings.language_saved", &updated.language, None);
                    Ok(Response::with_keyboard(text, KeyboardKind::MainMenu).in_locale(updated.language))
                }
                Err(e) if e.is_user_denial() => {
                    warn!(user_id = event.user_id, code = %code, "Unsupported language selected");
                    let text = ctx.i18n.t("settings.language_unsupported", &lang, None);
                    Ok(Response::text(text).in_locale(lang))
                }
                Err(e) => Err(e),
            }
        }

        CallbackAction::Menu(MenuAction::Search) => {
            let text = ctx.i18n.t("search.prompt", &lang, None);
            Ok(Response::text(text).in_locale(lang))
        }

        CallbackAction::Menu(MenuAction::TopTen) => {
            search::run_top_of_day(profile, ctx).await
        }

        CallbackAction::Menu(MenuAction::BestPrice) => {
            let text = ctx.i18n.t("search.best_price_prompt", &lang, None);
            Ok(Response::text(text).in_locale(lang))
        }

        CallbackAction::Menu(MenuAction::Favorites) => {
            crate::handlers::commands::favorites_response(profile, ctx).await
        }

        CallbackAction::Menu(MenuAction::Settings) => {
            let text = ctx.i18n.t("settings.title", &lang, None);
            Ok(Response::with_keyboard(
                text,
                KeyboardKind::SettingsMenu { notifications_enabled: profile.notifications_enabled },
            ).in_locale(lang))
        }

        CallbackAction::Menu(MenuAction::Help) => {
            let text = ctx.i18n.t("help.body", &lang, None);
            Ok(Response::with_keyboard(text, KeyboardKind::MainMenu).in_locale(lang))
        }

        CallbackAction::Settings(SettingsTarget::Country) => {
            let text = ctx.i18n.t("onboarding.choose_country", &lang, None);
            Ok(Response::with_keyboard(text, KeyboardKind::CountrySelect).in_locale(lang))
        }

        CallbackAction::Settings(SettingsTarget::Language) => {
            let text = ctx.i18n.t("settings.choose_language", &lang, None);
            Ok(Response::with_keyboard(text, KeyboardKind::LanguageSelect).in_locale(lang))
        }

        CallbackAction::ToggleNotifications => {
            // Current state is read before flipping; a duplicate delivery
            // never double-applies
            let updated = ctx.services.user_service.toggle_notifications(event.user_id).await?;
            let key = if updated.notifications_enabled {
                "settings.notifications_enabled"
            } else {
                "settings.notifications_disabled"
            };
            let text = ctx.i18n.t(key, &lang, None);
            Ok(Response::with_keyboard(
                text,
                KeyboardKind::SettingsMenu { notifications_enabled: updated.notifications_enabled },
            ).in_locale(lang))
        }

        CallbackAction::Favorite(product_id) => {
            handle_favorite_toggle(profile, &product_id, ctx).await
        }

        CallbackAction::More => handle_more(event, profile, ctx).await,

        CallbackAction::Repeat(entry_id) => {
            match ctx.services.db.history.find(profile.id, entry_id).await? {
                Some(entry) => {
                    let mut session = SearchSession::first_page(entry.query);
                    search::execute(profile, &mut session, ctx).await
                }
                None => Ok(menu_response(profile, ctx)),
            }
        }

        CallbackAction::Noop | CallbackAction::Unknown(_) => {
            // No-op response reusing the current menu
            Ok(menu_response(profile, ctx))
        }
    }
}

/// Toggle a favorite. The current row is read first: present means remove,
/// absent means add, so duplicate webhook deliveries never blind-insert.
async fn handle_favorite_toggle(
    profile: &UserProfile,
    product_id: &str,
    ctx: &AppContext,
) -> Result<Response> {
    let lang = profile.language.clone();

    match ctx.services.db.favorites.find(profile.id, product_id).await? {
        Some(existing) => {
            ctx.services.db.favorites.delete(existing.id).await?;
            info!(user_id = profile.id, product_id = %product_id, "Favorite removed");
            let text = ctx.i18n.t("favorites.removed", &lang, None);
            Ok(Response::text(text).in_locale(lang))
        }
        None => {
            // Snapshot resolution is best-effort; a double cache miss
            // degrades to a placeholder instead of failing the toggle
            let snapshot = ctx.services.snapshot_cache.get(product_id).await;
            let _ = ctx.services.db.favorites.insert(NewFavorite {
                user_id: profile.id,
                product_id: product_id.to_string(),
                title: snapshot.title,
                product_url: snapshot.product_url,
                image_url: snapshot.image_url,
                price: snapshot.price,
                currency: snapshot.currency,
            }).await?;

            info!(user_id = profile.id, product_id = %product_id, "Favorite added");
            let text = ctx.i18n.t("favorites.added", &lang, None);
            Ok(Response::text(text).in_locale(lang))
        }
    }
}

/// Pagination. Without a live session reporting more results, the callback
/// degrades to the menu; the vendor is never queried for a page that was
/// not offered.
async fn handle_more(event: &ChatEvent, profile: &UserProfile, ctx: &AppContext) -> Result<Response> {
    match ctx.state.load_session(event.user_id).await? {
        Some(mut session) if session.has_more => {
            session.page += 1;
            search::execute(profile, &mut session, ctx).await
        }
        _ => Ok(menu_response(profile, ctx)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_parse_known_namespaces() {
        assert_matches!(CallbackAction::parse("country:Germany"), CallbackAction::Country(c) if c == "Germany");
        assert_eq!(CallbackAction::parse("lang:uk"), CallbackAction::Language("uk".to_string()));
        assert_eq!(CallbackAction::parse("action:top10"), CallbackAction::Menu(MenuAction::TopTen));
        assert_eq!(CallbackAction::parse("settings:country"), CallbackAction::Settings(SettingsTarget::Country));
        assert_eq!(CallbackAction::parse("toggle:notifications"), CallbackAction::ToggleNotifications);
        assert_eq!(CallbackAction::parse("fav:12345"), CallbackAction::Favorite("12345".to_string()));
        assert_eq!(CallbackAction::parse("like:12345"), CallbackAction::Favorite("12345".to_string()));
        assert_eq!(CallbackAction::parse("more:next"), CallbackAction::More);
        assert_eq!(CallbackAction::parse("repeat:17"), CallbackAction::Repeat(17));
        assert_eq!(CallbackAction::parse("noop"), CallbackAction::Noop);
    }

    #[test]
    fn test_parse_unknown_namespace() {
        assert_eq!(
            CallbackAction::parse("mystery:thing"),
            CallbackAction::Unknown("mystery:thing".to_string())
        );
        assert_eq!(
            CallbackAction::parse("garbage"),
            CallbackAction::Unknown("garbage".to_string())
        );
    }

    #[test]
    fn test_parse_bad_repeat_id() {
        assert_eq!(
            CallbackAction::parse("repeat:abc"),
            CallbackAction::Unknown("repeat:abc".to_string())
        );
    }

    #[test]
    fn test_parse_unknown_menu_action() {
        assert_eq!(
            CallbackAction::parse("action:fly_to_moon"),
            CallbackAction::Unknown("action:fly_to_moon".to_string())
        );
    }
}
