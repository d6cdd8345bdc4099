//! Price-drop sweep job
//!
//! Scheduled entry point: re-query the vendor for every tracked favorite,
//! update the last observed price in place, and notify the owner only when
//! the drop meets the configured threshold. Each favorite is isolated:
//! a vendor or delivery failure moves on to the next one.

use std::time::Duration;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use tracing::{debug, info, warn};
use crate::handlers::AppContext;
use crate::models::broadcast::BroadcastLog;
use crate::models::product::SearchRequest;
use crate::services::format_price_drop_alert;
use crate::utils::errors::Result;
use crate::utils::helpers::truncate_text;

/// How much of the stored title is used as the re-query
const QUERY_TITLE_LENGTH: usize = 50;

/// Scheduled entry point
pub async fn run(ctx: &AppContext) -> Result<BroadcastLog> {
    info!("Starting price-drop sweep");

    let favorites = ctx.services.db.favorites.list_all_with_owners().await?;
    let threshold = ctx.settings.jobs.price_drop_threshold;
    let delay = Duration::from_millis(ctx.settings.jobs.send_delay_ms);

    let mut notified = 0;
    let mut failed = 0;
    let mut price_updates = 0;

    for (favorite, owner) in favorites {
        let query = truncate_text(&favorite.title, QUERY_TITLE_LENGTH);
        let request = SearchRequest::new(query, owner.country.clone(), favorite.currency.clone());

        let products = match ctx.services.vendor_service.lookup(&request).await {
            Ok(products) => products,
            Err(e) => {
                warn!(favorite_id = favorite.id, error = %e, "Price check failed, skipping favorite");
                tokio::time::sleep(delay).await;
                continue;
            }
        };

        // Prefer the exact item; fall back to the closest match
        let matching = products
            .iter()
            .find(|p| p.id == favorite.product_id)
            .or_else(|| products.first());

        if let Some(product) = matching {
            if product.price < favorite.last_price {
                let drop = favorite.drop_percent(product.price);

                if drop >= threshold {
                    let lang = &owner.language;
                    let text = format_price_drop_alert(
                        &favorite.title,
                        favorite.last_price,
                        product.price,
                        &favorite.currency,
                        drop,
                        &ctx.i18n.t("price_drop.title", lang, None),
                        &ctx.i18n.t("price_drop.dropped", lang, None),
                    );

                    match ctx.services.dispatcher
                        .send_text(owner.telegram_id, &text, view_keyboard(&favorite.product_url, &ctx.i18n, lang))
                        .await
                    {
                        Ok(()) => {
                            notified += 1;
                            debug!(favorite_id = favorite.id, drop = drop, "Price drop notification sent");
                        }
                        Err(e) => {
                            failed += 1;
                            warn!(chat_id = owner.telegram_id, error = %e, "Price drop notification failed");
                        }
                    }
                }

                ctx.services.db.favorites.update_last_price(favorite.id, product.price).await?;
                price_updates += 1;
            }
        }

        tokio::time::sleep(delay).await;
    }

    let message = format!("Price drop sweep: {} price updates", price_updates);
    let log = ctx.services.db.broadcasts
        .record("price_drop", &message, notified, failed)
        .await?;

    crate::utils::logging::log_job_run("price_drop", notified as u64, failed as u64);
    Ok(log)
}

fn view_keyboard(product_url: &str, i18n: &crate::i18n::I18n, lang: &str) -> Option<InlineKeyboardMarkup> {
    let view_url = url::Url::parse(product_url).ok()?;
    Some(InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::url(i18n.t("buttons.view", lang, None), view_url),
    ]]))
}
