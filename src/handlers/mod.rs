//! Update router
//!
//! Classifies a normalized `ChatEvent` into a callback action, a command or
//! a free-text search (first match wins), applies the profile gate, and
//! dispatches to the matching handler. Every branch produces a `Response`
//! descriptor; delivery is the outbound adapter's job.

pub mod callbacks;
pub mod commands;
pub mod keyboards;
pub mod search;

use tracing::{debug, error};
use crate::config::Settings;
use crate::i18n::I18n;
use crate::models::event::{ChatEvent, KeyboardKind, Response};
use crate::models::user::UserProfile;
use crate::services::{OutboundDispatcher, ServiceFactory, format_product_card};
use crate::state::StateStorage;
use crate::utils::errors::Result;
use callbacks::CallbackAction;
use commands::Command;

/// Shared handler dependencies
#[derive(Clone)]
pub struct AppContext {
    pub services: ServiceFactory,
    pub state: StateStorage,
    pub i18n: I18n,
    pub settings: Settings,
}

/// How one event was classified; first match wins
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    Callback(CallbackAction),
    Command(Command),
    FreeTextSearch(String),
    Fallback,
}

/// Pure classification step: callback, then command, then free text,
/// then fallback
pub fn classify(event: &ChatEvent) -> EventKind {
    if let Some(data) = &event.callback_data {
        return EventKind::Callback(CallbackAction::parse(data));
    }

    if let Some(text) = &event.text {
        let trimmed = text.trim();
        if let Some(command) = Command::parse(trimmed) {
            return EventKind::Command(command);
        }
        if trimmed.len() > 1 && !trimmed.starts_with('/') {
            return EventKind::FreeTextSearch(trimmed.to_string());
        }
    }

    EventKind::Fallback
}

/// Route one event to its handler and produce a response descriptor.
///
/// Profile gate: without a stored profile carrying a chosen country, every
/// branch except `/start` and country-selection callbacks short-circuits to
/// the country prompt, so the search pipeline never runs without a resolved
/// country and currency.
pub async fn route_event(event: &ChatEvent, ctx: &AppContext) -> Result<Response> {
    let kind = classify(event);
    debug!(user_id = event.user_id, kind = ?kind, "Event classified");

    let profile = ctx.services.user_service
        .get_by_telegram_id(event.user_id)
        .await?
        .filter(|p| p.has_country());

    match kind {
        // The only two branches allowed before a country is chosen
        EventKind::Callback(CallbackAction::Country(country)) => {
            callbacks::handle_country(event, &country, ctx).await
        }
        EventKind::Command(Command::Start { referral_code }) => {
            commands::handle_start(event, referral_code.as_deref(), ctx).await
        }

        kind => {
            let Some(profile) = profile else {
                return Ok(country_prompt(event, ctx));
            };

            match kind {
                EventKind::Callback(action) => callbacks::handle(action, event, &profile, ctx).await,
                EventKind::Command(Command::Help) => commands::handle_help(&profile, ctx).await,
                EventKind::Command(Command::Profile) => commands::handle_profile(&profile, ctx).await,
                EventKind::Command(Command::Favorites) => commands::favorites_response(&profile, ctx).await,
                EventKind::Command(Command::Top) => commands::handle_top(&profile, ctx).await,
                EventKind::Command(Command::Settings) => commands::handle_settings(&profile, ctx).await,
                EventKind::Command(Command::Admin) => commands::handle_admin(&profile, ctx).await,
                EventKind::Command(Command::Start { .. }) => {
                    commands::handle_start(event, None, ctx).await
                }
                EventKind::FreeTextSearch(text) => {
                    search::handle_free_text(&text, &profile, ctx).await
                }
                EventKind::Fallback => Ok(menu_response(&profile, ctx)),
            }
        }
    }
}

/// The "choose your country" gate response
fn country_prompt(event: &ChatEvent, ctx: &AppContext) -> Response {
    let lang = ctx.i18n.detect_user_language(event.locale.as_deref());
    let text = ctx.i18n.t("onboarding.choose_country", &lang, None);
    Response::with_keyboard(text, KeyboardKind::CountrySelect).in_locale(lang)
}

/// The no-op response: current main menu in the user's language
pub fn menu_response(profile: &UserProfile, ctx: &AppContext) -> Response {
    let lang = profile.language.clone();
    let text = ctx.i18n.t("menu.title", &lang, None);
    Response::with_keyboard(text, KeyboardKind::MainMenu).in_locale(lang)
}

/// Render and deliver one response descriptor: product cards first, then
/// the text with its keyboard (plus the "show more" row when offered).
pub async fn deliver_response(
    dispatcher: &dyn OutboundDispatcher,
    chat_id: i64,
    response: &Response,
    i18n: &I18n,
) -> Result<()> {
    let lang = &response.locale;

    for product in &response.products {
        let card = format_product_card(product);
        let keyboard = keyboards::product_keyboard(product, i18n, lang);
        if let Err(e) = dispatcher
            .send_photo(chat_id, &product.image_url, &card, Some(keyboard))
            .await
        {
            // One card failing should not hide the rest of the page
            error!(chat_id = chat_id, product_id = %product.id, error = %e, "Product card delivery failed");
        }
    }

    let keyboard = if response.has_more {
        Some(keyboards::more_keyboard(i18n, lang))
    } else {
        keyboards::render(&response.keyboard, i18n, lang)
    };

    if !response.text.is_empty() || keyboard.is_some() {
        dispatcher.send_text(chat_id, &response.text, keyboard).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_callback_wins_over_text() {
        let mut event = ChatEvent::callback(1, 1, "action:top10");
        event.text = Some("/help".to_string());
        assert!(matches!(classify(&event), EventKind::Callback(_)));
    }

    #[test]
    fn test_classify_command() {
        let event = ChatEvent::message(1, 1, "/profile");
        assert_eq!(classify(&event), EventKind::Command(Command::Profile));
    }

    #[test]
    fn test_classify_free_text() {
        let event = ChatEvent::message(1, 1, "bluetooth headphones");
        assert_eq!(
            classify(&event),
            EventKind::FreeTextSearch("bluetooth headphones".to_string())
        );
    }

    #[test]
    fn test_classify_short_or_command_like_text_falls_back() {
        assert_eq!(classify(&ChatEvent::message(1, 1, "a")), EventKind::Fallback);
        assert_eq!(classify(&ChatEvent::message(1, 1, "/frobnicate")), EventKind::Fallback);
        assert_eq!(classify(&ChatEvent::message(1, 1, "  ")), EventKind::Fallback);
    }

    #[test]
    fn test_classify_unknown_callback_namespace() {
        let event = ChatEvent::callback(1, 1, "mystery:thing");
        assert_eq!(
            classify(&event),
            EventKind::Callback(CallbackAction::Unknown("mystery:thing".to_string()))
        );
    }
}
