//! DealScout Telegram Bot
//!
//! A Telegram bot that finds AliExpress deals for a user's country and
//! currency, tracks favorites for price drops, and rewards referrals with
//! coupons. This library provides the update router, the vendor query
//! pipeline, the referral reward ledger and the batch fan-out jobs with
//! multi-language support.

#![allow(non_snake_case)]

pub mod config;
pub mod handlers;
pub mod services;
pub mod models;
pub mod database;
pub mod state;
pub mod jobs;
pub mod i18n;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{DealScoutError, Result};

// Re-export main components for easy access
pub use database::DatabaseService;
pub use services::ServiceFactory;
pub use handlers::AppContext;
pub use state::StateStorage;
pub use i18n::I18n;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
