//! Batch fan-out isolation tests
//!
//! The broadcast loop must keep going when one recipient's delivery fails,
//! and the aggregate counters must reflect exactly what happened.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;
use async_trait::async_trait;
use teloxide::types::InlineKeyboardMarkup;

use DealScout::config::I18nConfig;
use DealScout::i18n::I18n;
use DealScout::jobs::{fan_out, BroadcastRecipient};
use DealScout::models::product::Product;
use DealScout::services::OutboundDispatcher;
use DealScout::utils::errors::{DealScoutError, Result};

/// Dispatcher double: records every send, fails for configured chats
struct MockDispatcher {
    failing_chats: HashSet<i64>,
    sent: Mutex<Vec<(i64, String)>>,
}

impl MockDispatcher {
    fn new(failing_chats: impl IntoIterator<Item = i64>) -> Self {
        Self {
            failing_chats: failing_chats.into_iter().collect(),
            sent: Mutex::new(Vec::new()),
        }
    }

    fn deliveries_for(&self, chat_id: i64) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(chat, _)| *chat == chat_id)
            .count()
    }
}

#[async_trait]
impl OutboundDispatcher for MockDispatcher {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        _keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<()> {
        if self.failing_chats.contains(&chat_id) {
            return Err(DealScoutError::ServiceUnavailable(format!("chat {} unreachable", chat_id)));
        }
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        Ok(())
    }

    async fn send_photo(
        &self,
        chat_id: i64,
        _photo_url: &str,
        caption: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<()> {
        self.send_text(chat_id, caption, keyboard).await
    }
}

async fn test_i18n() -> I18n {
    let config = I18nConfig {
        default_language: "en".to_string(),
        supported_languages: vec!["en".to_string()],
    };
    let mut i18n = I18n::new(&config);
    i18n.load_translations().await.expect("translations/en.json must load");
    i18n
}

fn recipient(chat_id: i64) -> BroadcastRecipient {
    BroadcastRecipient {
        chat_id,
        language: "en".to_string(),
        country: "Germany".to_string(),
    }
}

fn sample_product(id: &str) -> Product {
    Product {
        id: id.to_string(),
        title: format!("Product {}", id),
        price: 9.99,
        original_price: 19.99,
        currency: "EUR".to_string(),
        discount_percent: 50,
        rating: 4.8,
        orders: 5000,
        image_url: "https://img.example.com/p.jpg".to_string(),
        product_url: "https://example.com/item/1".to_string(),
        affiliate_url: "https://s.click.example.com/1".to_string(),
        free_shipping: true,
        score: 0.7,
    }
}

#[tokio::test]
async fn one_failing_recipient_does_not_abort_the_fan_out() {
    let i18n = test_i18n().await;
    let dispatcher = MockDispatcher::new([2]);

    let recipients = vec![recipient(1), recipient(2), recipient(3)];
    let mut products_by_country = HashMap::new();
    products_by_country.insert("Germany".to_string(), vec![sample_product("a"), sample_product("b")]);

    let (sent, failed) = fan_out(
        &dispatcher,
        &i18n,
        &recipients,
        &products_by_country,
        5,
        Duration::from_millis(0),
    )
    .await;

    assert_eq!(sent, 2);
    assert_eq!(failed, 1);

    // recipients 1 and 3 each got intro + 2 cards + footer
    assert_eq!(dispatcher.deliveries_for(1), 4);
    assert_eq!(dispatcher.deliveries_for(3), 4);
    assert_eq!(dispatcher.deliveries_for(2), 0);
}

#[tokio::test]
async fn recipients_without_country_products_still_get_the_intro() {
    let i18n = test_i18n().await;
    let dispatcher = MockDispatcher::new([]);

    let recipients = vec![recipient(7)];
    let products_by_country: HashMap<String, Vec<Product>> = HashMap::new();

    let (sent, failed) = fan_out(
        &dispatcher,
        &i18n,
        &recipients,
        &products_by_country,
        5,
        Duration::from_millis(0),
    )
    .await;

    assert_eq!(sent, 1);
    assert_eq!(failed, 0);
    // intro + footer, no cards
    assert_eq!(dispatcher.deliveries_for(7), 2);
}

#[tokio::test]
async fn product_cap_limits_cards_per_recipient() {
    let i18n = test_i18n().await;
    let dispatcher = MockDispatcher::new([]);

    let recipients = vec![recipient(9)];
    let mut products_by_country = HashMap::new();
    products_by_country.insert(
        "Germany".to_string(),
        (0..10).map(|i| sample_product(&i.to_string())).collect::<Vec<_>>(),
    );

    let (sent, _failed) = fan_out(
        &dispatcher,
        &i18n,
        &recipients,
        &products_by_country,
        3,
        Duration::from_millis(0),
    )
    .await;

    assert_eq!(sent, 1);
    // intro + 3 cards + footer
    assert_eq!(dispatcher.deliveries_for(9), 5);
}
