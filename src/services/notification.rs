//! Notification service implementation
//!
//! Outbound delivery seam. The router and the batch jobs only produce
//! descriptors; this module renders product cards and hands messages to an
//! `OutboundDispatcher`. The Telegram implementation sends HTML and retries
//! once with markup stripped when the API rejects the formatting.
//! Delivery is best-effort with at most one retry.

use async_trait::async_trait;
use teloxide::{
    Bot,
    payloads::{SendMessageSetters, SendPhotoSetters},
    prelude::Requester,
    types::{ChatId, InlineKeyboardMarkup, InputFile, ParseMode},
};
use tracing::{debug, warn};
use crate::models::product::Product;
use crate::utils::errors::Result;
use crate::utils::helpers::{format_orders, strip_html, truncate_text};

/// Outbound delivery boundary
#[async_trait]
pub trait OutboundDispatcher: Send + Sync {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<()>;

    async fn send_photo(
        &self,
        chat_id: i64,
        photo_url: &str,
        caption: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<()>;
}

/// Telegram-backed dispatcher
#[derive(Clone)]
pub struct TelegramDispatcher {
    bot: Bot,
}

impl TelegramDispatcher {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl OutboundDispatcher for TelegramDispatcher {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<()> {
        let chat = ChatId(chat_id);

        let mut request = self.bot.send_message(chat, text.to_string()).parse_mode(ParseMode::Html);
        if let Some(markup) = keyboard.clone() {
            request = request.reply_markup(markup);
        }

        match request.await {
            Ok(_) => Ok(()),
            Err(e) => {
                // Formatting rejections get one plain-text retry
                debug!(chat_id = chat_id, error = %e, "HTML send failed, retrying as plain text");
                let mut retry = self.bot.send_message(chat, strip_html(text));
                if let Some(markup) = keyboard {
                    retry = retry.reply_markup(markup);
                }
                retry.await?;
                Ok(())
            }
        }
    }

    async fn send_photo(
        &self,
        chat_id: i64,
        photo_url: &str,
        caption: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<()> {
        let chat = ChatId(chat_id);

        let photo = match url::Url::parse(photo_url) {
            Ok(parsed) => InputFile::url(parsed),
            Err(e) => {
                // Unusable image degrades to a text card
                warn!(chat_id = chat_id, error = %e, "Bad photo URL, sending text card");
                return self.send_text(chat_id, caption, keyboard).await;
            }
        };

        let mut request = self.bot
            .send_photo(chat, photo)
            .caption(caption.to_string())
            .parse_mode(ParseMode::Html);
        if let Some(markup) = keyboard.clone() {
            request = request.reply_markup(markup);
        }

        match request.await {
            Ok(_) => Ok(()),
            Err(e) => {
                debug!(chat_id = chat_id, error = %e, "Photo send failed, retrying as text");
                self.send_text(chat_id, caption, keyboard).await
            }
        }
    }
}

/// Render one product card as HTML
pub fn format_product_card(product: &Product) -> String {
    let price_text = if product.discount_percent > 0 {
        format!(
            "<s>{:.2}</s> <b>{:.2} {}</b> (-{}%)",
            product.original_price, product.price, product.currency, product.discount_percent
        )
    } else {
        format!("<b>{:.2} {}</b>", product.price, product.currency)
    };

    let mut stats = Vec::new();
    if product.rating > 0.0 {
        stats.push(format!("⭐ {:.1}", product.rating));
    }
    if product.orders > 0 {
        stats.push(format!("🛒 {}", format_orders(product.orders)));
    }
    if product.free_shipping {
        stats.push("🚚 Free".to_string());
    }

    format!(
        "📦 <b>{}</b>\n\n💰 {}\n{}",
        truncate_text(&product.title, 100),
        price_text,
        stats.join(" | ")
    )
}

/// Render a price-drop alert for a tracked favorite
pub fn format_price_drop_alert(
    title: &str,
    old_price: f64,
    new_price: f64,
    currency: &str,
    drop_percent: u32,
    headline: &str,
    dropped_line: &str,
) -> String {
    format!(
        "{}\n\n📦 <b>{}</b>\n\n💰 <s>{:.2} {}</s> → <b>{:.2} {}</b>\n{}",
        headline,
        truncate_text(title, 80),
        old_price,
        currency,
        new_price,
        currency,
        dropped_line.replace("{percent}", &drop_percent.to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(discount: u32, rating: f64, orders: i64, free_shipping: bool) -> Product {
        Product {
            id: "p1".to_string(),
            title: "Wireless earbuds".to_string(),
            price: 9.99,
            original_price: 19.99,
            currency: "EUR".to_string(),
            discount_percent: discount,
            rating,
            orders,
            image_url: String::new(),
            product_url: String::new(),
            affiliate_url: String::new(),
            free_shipping,
            score: 0.0,
        }
    }

    #[test]
    fn test_card_shows_discount_and_stats() {
        let card = format_product_card(&product(50, 4.8, 12456, true));
        assert!(card.contains("<s>19.99</s>"));
        assert!(card.contains("(-50%)"));
        assert!(card.contains("⭐ 4.8"));
        assert!(card.contains("🛒 12.5K"));
        assert!(card.contains("🚚 Free"));
    }

    #[test]
    fn test_card_without_discount_or_stats() {
        let card = format_product_card(&product(0, 0.0, 0, false));
        assert!(!card.contains("<s>"));
        assert!(!card.contains("⭐"));
        assert!(card.contains("<b>9.99 EUR</b>"));
    }

    #[test]
    fn test_price_drop_alert_substitutes_percent() {
        let alert = format_price_drop_alert(
            "Wireless earbuds", 20.0, 17.0, "EUR", 15,
            "<b>Price dropped!</b>", "Down by <b>{percent}%</b>",
        );
        assert!(alert.contains("Down by <b>15%</b>"));
        assert!(alert.contains("<s>20.00 EUR</s>"));
        assert!(alert.contains("<b>17.00 EUR</b>"));
    }
}
