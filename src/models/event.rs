//! Normalized inbound events and response descriptors
//!
//! The webhook transport (teloxide dispatcher in `main.rs`) normalizes raw
//! updates into `ChatEvent`; the router answers with a `Response` descriptor
//! that the outbound dispatcher renders and delivers.

use serde::{Deserialize, Serialize};
use crate::models::product::Product;

/// One normalized inbound chat event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEvent {
    pub user_id: i64,
    pub chat_id: i64,
    pub text: Option<String>,
    pub is_callback: bool,
    pub callback_data: Option<String>,
    /// Telegram locale hint (e.g. "en-US")
    pub locale: Option<String>,
    pub display_name: Option<String>,
}

impl ChatEvent {
    pub fn message(user_id: i64, chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            user_id,
            chat_id,
            text: Some(text.into()),
            is_callback: false,
            callback_data: None,
            locale: None,
            display_name: None,
        }
    }

    pub fn callback(user_id: i64, chat_id: i64, data: impl Into<String>) -> Self {
        Self {
            user_id,
            chat_id,
            text: None,
            is_callback: true,
            callback_data: Some(data.into()),
            locale: None,
            display_name: None,
        }
    }
}

/// Keyboard layout attached to the response text. The descriptor stays
/// transport-independent; the outbound adapter renders the actual markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KeyboardKind {
    None,
    CountrySelect,
    LanguageSelect,
    MainMenu,
    SettingsMenu { notifications_enabled: bool },
    /// (history entry id, query) pairs for the repeat-search buttons
    RecentSearches(Vec<(i64, String)>),
}

/// Response descriptor produced by the update router
#[derive(Debug, Clone)]
pub struct Response {
    pub text: String,
    pub keyboard: KeyboardKind,
    pub products: Vec<Product>,
    pub has_more: bool,
    /// Language the response (and its keyboard labels) should render in
    pub locale: String,
}

impl Response {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: KeyboardKind::None,
            products: Vec::new(),
            has_more: false,
            locale: "en".to_string(),
        }
    }

    pub fn with_keyboard(text: impl Into<String>, keyboard: KeyboardKind) -> Self {
        Self {
            keyboard,
            ..Self::text(text)
        }
    }

    pub fn with_products(text: impl Into<String>, products: Vec<Product>, has_more: bool) -> Self {
        Self {
            products,
            has_more,
            ..Self::text(text)
        }
    }

    pub fn in_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }
}
