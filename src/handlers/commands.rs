//! Command handlers
//!
//! Slash commands recognized by the router. `/start` doubles as the
//! referral entry point: a payload after the command is treated as a
//! referral code and linked exactly once at registration time.

use std::collections::HashMap;
use tracing::{info, warn};
use crate::handlers::{search, AppContext};
use crate::models::event::{ChatEvent, KeyboardKind, Response};
use crate::models::user::UserProfile;
use crate::utils::errors::Result;
use crate::utils::helpers::truncate_text;

/// Number of recent searches shown in the profile view
const RECENT_SEARCH_WINDOW: i64 = 10;

/// Recognized slash commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start { referral_code: Option<String> },
    Help,
    Profile,
    Favorites,
    Top,
    Settings,
    Admin,
}

impl Command {
    /// Decode a command token; None for anything unrecognized
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.trim().split_whitespace();
        let head = parts.next()?;

        // Group-chat form "/start@SomeBot" carries the bot name
        let command = head.split('@').next().unwrap_or(head);

        match command {
            "/start" => Some(Command::Start {
                referral_code: parts.next().map(|code| code.to_string()),
            }),
            "/help" => Some(Command::Help),
            "/profile" => Some(Command::Profile),
            "/favorites" => Some(Command::Favorites),
            "/top" => Some(Command::Top),
            "/settings" => Some(Command::Settings),
            "/admin" => Some(Command::Admin),
            _ => None,
        }
    }
}

/// `/start [referral_code]`: registration and referral linking
pub async fn handle_start(
    event: &ChatEvent,
    referral_code: Option<&str>,
    ctx: &AppContext,
) -> Result<Response> {
    let (profile, created) = ctx.services.user_service
        .register_or_get(
            event.user_id,
            None,
            event.display_name.clone(),
            event.locale.as_deref(),
        )
        .await?;

    let lang = profile.language.clone();
    let mut params = HashMap::new();
    params.insert("name".to_string(), profile.display_name().to_string());

    let mut text = if created {
        ctx.i18n.t("onboarding.welcome", &lang, Some(&params))
    } else {
        ctx.i18n.t("onboarding.welcome_back", &lang, Some(&params))
    };

    // Referral linking happens only at creation time; denials are logged
    // and swallowed so they never break onboarding
    if created {
        if let Some(code) = referral_code {
            match ctx.services.referral_service.process_referral(&profile, code).await {
                Ok(referrer_name) => {
                    let mut referral_params = HashMap::new();
                    referral_params.insert("referrer".to_string(), referrer_name);
                    text.push_str("\n\n");
                    text.push_str(&ctx.i18n.t("referral.joined_via", &lang, Some(&referral_params)));
                }
                Err(e) if e.is_user_denial() => {
                    info!(user_id = profile.id, code = %code, reason = %e, "Referral link rejected");
                }
                Err(e) => {
                    warn!(user_id = profile.id, error = %e, "Referral processing failed");
                }
            }
        }
    }

    if profile.has_country() {
        Ok(Response::with_keyboard(text, KeyboardKind::MainMenu).in_locale(lang))
    } else {
        text.push_str("\n\n");
        text.push_str(&ctx.i18n.t("onboarding.choose_country", &lang, None));
        Ok(Response::with_keyboard(text, KeyboardKind::CountrySelect).in_locale(lang))
    }
}

/// `/help`
pub async fn handle_help(profile: &UserProfile, ctx: &AppContext) -> Result<Response> {
    let lang = profile.language.clone();
    let text = ctx.i18n.t("help.body", &lang, None);
    Ok(Response::with_keyboard(text, KeyboardKind::MainMenu).in_locale(lang))
}

/// `/profile`: settings summary, referral stats and recent searches
pub async fn handle_profile(profile: &UserProfile, ctx: &AppContext) -> Result<Response> {
    let lang = profile.language.clone();
    let stats = ctx.services.referral_service.stats(profile).await?;
    let recent = ctx.services.db.history.recent(profile.id, RECENT_SEARCH_WINDOW).await?;

    let mut params = HashMap::new();
    params.insert("name".to_string(), profile.display_name().to_string());
    params.insert("country".to_string(), profile.country.clone());
    params.insert("currency".to_string(), profile.currency.clone());
    params.insert("language".to_string(), profile.language.clone());
    params.insert("points".to_string(), profile.reward_points.to_string());
    params.insert("referral_link".to_string(), stats.link.clone());
    params.insert("referral_count".to_string(), stats.referral_count.to_string());

    let mut text = ctx.i18n.t("profile.summary", &lang, Some(&params));

    if !stats.coupons.is_empty() {
        text.push_str("\n\n");
        text.push_str(&ctx.i18n.t("profile.coupons_header", &lang, None));
        for coupon in &stats.coupons {
            text.push_str(&format!("\n🎁 <code>{}</code> — {}%", coupon.code, coupon.discount_percent));
        }
    }

    let keyboard = if recent.is_empty() {
        KeyboardKind::MainMenu
    } else {
        KeyboardKind::RecentSearches(
            recent.into_iter().map(|entry| (entry.id, entry.query)).collect(),
        )
    };

    Ok(Response::with_keyboard(text, keyboard).in_locale(lang))
}

/// `/favorites`, also reused by the menu callback
pub async fn favorites_response(profile: &UserProfile, ctx: &AppContext) -> Result<Response> {
    let lang = profile.language.clone();
    let favorites = ctx.services.db.favorites.list_for_user(profile.id).await?;

    if favorites.is_empty() {
        let text = ctx.i18n.t("favorites.empty", &lang, None);
        return Ok(Response::with_keyboard(text, KeyboardKind::MainMenu).in_locale(lang));
    }

    let mut text = ctx.i18n.t("favorites.header", &lang, None);
    for favorite in &favorites {
        let title = if favorite.title.is_empty() {
            favorite.product_id.clone()
        } else {
            truncate_text(&favorite.title, 60)
        };
        text.push_str(&format!(
            "\n• <a href=\"{}\">{}</a> — {:.2} {}",
            favorite.product_url, title, favorite.last_price, favorite.currency
        ));
    }

    Ok(Response::with_keyboard(text, KeyboardKind::MainMenu).in_locale(lang))
}

/// `/top`
pub async fn handle_top(profile: &UserProfile, ctx: &AppContext) -> Result<Response> {
    search::run_top_of_day(profile, ctx).await
}

/// `/settings`
pub async fn handle_settings(profile: &UserProfile, ctx: &AppContext) -> Result<Response> {
    let lang = profile.language.clone();
    let text = ctx.i18n.t("settings.title", &lang, None);
    Ok(Response::with_keyboard(
        text,
        KeyboardKind::SettingsMenu { notifications_enabled: profile.notifications_enabled },
    ).in_locale(lang))
}

/// `/admin`: user statistics, gated on configured admin ids
pub async fn handle_admin(profile: &UserProfile, ctx: &AppContext) -> Result<Response> {
    let lang = profile.language.clone();

    if !ctx.settings.features.admin_panel
        || !ctx.settings.bot.admin_ids.contains(&profile.telegram_id)
    {
        warn!(user_id = profile.id, "Admin panel access denied");
        let text = ctx.i18n.t("admin.denied", &lang, None);
        return Ok(Response::text(text).in_locale(lang));
    }

    let total = ctx.services.db.users.count().await?;
    let by_country = ctx.services.db.users.count_by_country().await?;
    let by_language = ctx.services.db.users.count_by_language().await?;

    let mut text = format!("📊 <b>Users:</b> {}\n\n<b>By country:</b>", total);
    for (country, count) in by_country {
        text.push_str(&format!("\n• {} — {}", country, count));
    }
    text.push_str("\n\n<b>By language:</b>");
    for (language, count) in by_language {
        text.push_str(&format!("\n• {} — {}", language, count));
    }

    Ok(Response::text(text).in_locale(lang))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/help"), Some(Command::Help));
        assert_eq!(Command::parse("/top"), Some(Command::Top));
        assert_eq!(Command::parse("/settings "), Some(Command::Settings));
        assert_eq!(Command::parse("/start"), Some(Command::Start { referral_code: None }));
    }

    #[test]
    fn test_parse_start_with_referral_payload() {
        assert_eq!(
            Command::parse("/start DS4FZZ"),
            Some(Command::Start { referral_code: Some("DS4FZZ".to_string()) })
        );
    }

    #[test]
    fn test_parse_strips_bot_mention() {
        assert_eq!(Command::parse("/help@DealScoutBot"), Some(Command::Help));
    }

    #[test]
    fn test_parse_rejects_unknown_and_plain_text() {
        assert_eq!(Command::parse("/frobnicate"), None);
        assert_eq!(Command::parse("bluetooth headphones"), None);
    }
}
