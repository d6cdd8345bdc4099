//! Daily top-sellers broadcast job
//!
//! Scheduled entry point: collect notification-enabled users with a chosen
//! country, run the search pipeline once per distinct country, and fan the
//! shared result out to every recipient of that country. One recipient's
//! failure never aborts the loop; the run ends with one broadcast_log row.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;
use rand::seq::SliceRandom;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use tracing::{info, warn};
use crate::handlers::search::TRENDING_QUERIES;
use crate::handlers::AppContext;
use crate::i18n::I18n;
use crate::models::broadcast::BroadcastLog;
use crate::models::product::{Product, SearchRequest};
use crate::services::{format_product_card, OutboundDispatcher};
use crate::utils::errors::Result;
use crate::utils::helpers::country_currency;

/// One delivery target of the broadcast
#[derive(Debug, Clone)]
pub struct BroadcastRecipient {
    pub chat_id: i64,
    pub language: String,
    pub country: String,
}

/// Scheduled entry point
pub async fn run(ctx: &AppContext) -> Result<BroadcastLog> {
    info!("Starting daily top broadcast");

    let users = ctx.services.db.users.list_notifiable().await?;
    let recipients: Vec<BroadcastRecipient> = users
        .iter()
        .map(|user| BroadcastRecipient {
            chat_id: user.telegram_id,
            language: user.language.clone(),
            country: user.country.clone(),
        })
        .collect();

    let products_by_country = fetch_products_per_country(ctx, &recipients).await;

    let delay = Duration::from_millis(ctx.settings.jobs.send_delay_ms);
    let (sent, failed) = fan_out(
        ctx.services.dispatcher.as_ref(),
        &ctx.i18n,
        &recipients,
        &products_by_country,
        ctx.settings.jobs.broadcast_products,
        delay,
    )
    .await;

    let log = ctx.services.db.broadcasts
        .record("daily_top", "Daily top deals broadcast", sent, failed)
        .await?;

    crate::utils::logging::log_job_run("daily_top", sent as u64, failed as u64);
    Ok(log)
}

/// One pipeline call per distinct country; a failed country degrades to an
/// empty list for its recipients instead of failing the run
async fn fetch_products_per_country(
    ctx: &AppContext,
    recipients: &[BroadcastRecipient],
) -> HashMap<String, Vec<Product>> {
    let countries: BTreeSet<String> = recipients.iter().map(|r| r.country.clone()).collect();
    let mut products_by_country = HashMap::new();

    for country in countries {
        let query = TRENDING_QUERIES
            .choose(&mut rand::thread_rng())
            .unwrap_or(&TRENDING_QUERIES[0])
            .to_string();

        let mut request = SearchRequest::new(query, country.clone(), country_currency(&country));
        request.page_size = 10;

        let outcome = ctx.services.vendor_service.search(&request).await;
        if !outcome.success {
            warn!(country = %country, "Top products fetch failed for country");
        }

        ctx.services.snapshot_cache.put_all(&outcome.products);
        products_by_country.insert(country, outcome.products);
    }

    products_by_country
}

/// Deliver the broadcast to each recipient, isolating failures and pausing
/// between consecutive sends. Returns (sent, failed) counts.
pub async fn fan_out(
    dispatcher: &dyn OutboundDispatcher,
    i18n: &I18n,
    recipients: &[BroadcastRecipient],
    products_by_country: &HashMap<String, Vec<Product>>,
    products_per_user: usize,
    delay: Duration,
) -> (i32, i32) {
    let mut sent = 0;
    let mut failed = 0;

    for recipient in recipients {
        let lang = &recipient.language;
        let intro = i18n.t("broadcast.morning", lang, None);

        match dispatcher.send_text(recipient.chat_id, &intro, None).await {
            Ok(()) => {}
            Err(e) => {
                warn!(chat_id = recipient.chat_id, error = %e, "Broadcast intro failed, skipping recipient");
                failed += 1;
                tokio::time::sleep(delay).await;
                continue;
            }
        }

        let products = products_by_country
            .get(&recipient.country)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        for product in products.iter().take(products_per_user) {
            let card = format_product_card(product);
            let keyboard = buy_keyboard(product, i18n, lang);
            if let Err(e) = dispatcher
                .send_photo(recipient.chat_id, &product.image_url, &card, keyboard)
                .await
            {
                warn!(chat_id = recipient.chat_id, product_id = %product.id, error = %e,
                      "Broadcast product card failed");
            }
            tokio::time::sleep(delay).await;
        }

        let footer = i18n.t("broadcast.footer", lang, None);
        if let Err(e) = dispatcher
            .send_text(recipient.chat_id, &footer, Some(footer_keyboard(i18n, lang)))
            .await
        {
            warn!(chat_id = recipient.chat_id, error = %e, "Broadcast footer failed");
        }

        sent += 1;
        tokio::time::sleep(delay).await;
    }

    (sent, failed)
}

fn buy_keyboard(product: &Product, i18n: &I18n, lang: &str) -> Option<InlineKeyboardMarkup> {
    let buy_url = url::Url::parse(&product.affiliate_url).ok()?;
    Some(InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::url(i18n.t("buttons.buy", lang, None), buy_url),
    ]]))
}

fn footer_keyboard(i18n: &I18n, lang: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            i18n.t("buttons.top10", lang, None),
            "action:top10",
        )],
        vec![InlineKeyboardButton::callback(
            i18n.t("buttons.notifications_off", lang, None),
            "toggle:notifications",
        )],
    ])
}
