//! Services module
//!
//! This module contains business logic services

pub mod notification;
pub mod referral;
pub mod snapshot_cache;
pub mod translation;
pub mod user;
pub mod vendor;

// Re-export commonly used services
pub use notification::{OutboundDispatcher, TelegramDispatcher, format_product_card, format_price_drop_alert};
pub use referral::{ReferralService, ReferralStats};
pub use snapshot_cache::SnapshotCache;
pub use translation::{TranslationService, GenerativeTranslator, QueryTranslator};
pub use user::UserService;
pub use vendor::VendorService;

use std::sync::Arc;
use teloxide::Bot;
use crate::config::settings::Settings;
use crate::database::DatabaseService;
use crate::i18n::I18n;
use crate::utils::errors::Result;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub db: DatabaseService,
    pub user_service: UserService,
    pub vendor_service: VendorService,
    pub translation_service: TranslationService,
    pub snapshot_cache: SnapshotCache,
    pub referral_service: ReferralService,
    pub dispatcher: Arc<dyn OutboundDispatcher>,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    pub fn new(bot: Bot, settings: Settings, db: DatabaseService, i18n: I18n) -> Result<Self> {
        let dispatcher: Arc<dyn OutboundDispatcher> = Arc::new(TelegramDispatcher::new(bot));

        let user_service = UserService::new(db.users.clone(), settings.clone());
        let vendor_service = VendorService::new(settings.vendor.clone())?;
        let translator = GenerativeTranslator::new(settings.translator.clone())?;
        let translation_service = TranslationService::new(Arc::new(translator));
        let snapshot_cache = SnapshotCache::new(db.snapshots.clone());
        let referral_service = ReferralService::new(
            db.users.clone(),
            db.referrals.clone(),
            db.coupons.clone(),
            Arc::clone(&dispatcher),
            i18n,
            settings.referral.clone(),
            settings.bot.username.clone(),
        );

        Ok(Self {
            db,
            user_service,
            vendor_service,
            translation_service,
            snapshot_cache,
            referral_service,
            dispatcher,
        })
    }
}
