//! User service implementation
//!
//! This service handles user registration, profile management, language
//! preferences, country/currency selection and the notification opt-in.

use tracing::{debug, info, warn};
use crate::config::settings::Settings;
use crate::database::repositories::UserRepository;
use crate::models::user::{UserProfile, CreateUserRequest, UpdateUserRequest};
use crate::utils::errors::{DealScoutError, Result};
use crate::utils::helpers::country_currency;

/// User service for managing profile operations
#[derive(Clone)]
pub struct UserService {
    user_repository: UserRepository,
    settings: Settings,
}

impl UserService {
    /// Create a new UserService instance
    pub fn new(user_repository: UserRepository, settings: Settings) -> Self {
        Self {
            user_repository,
            settings,
        }
    }

    /// Register a new user or get the existing profile
    pub async fn register_or_get(
        &self,
        telegram_id: i64,
        username: Option<String>,
        first_name: Option<String>,
        locale: Option<&str>,
    ) -> Result<(UserProfile, bool)> {
        debug!(telegram_id = telegram_id, "Attempting to register or get user");

        if let Some(existing) = self.user_repository.find_by_telegram_id(telegram_id).await? {
            return Ok((existing, false));
        }

        let language = locale
            .map(|l| l.split('-').next().unwrap_or(l).to_string())
            .filter(|l| self.settings.i18n.supported_languages.contains(l))
            .unwrap_or_else(|| self.settings.i18n.default_language.clone());

        let user = self.user_repository.create(CreateUserRequest {
            telegram_id,
            username,
            first_name,
            language: Some(language),
        }).await?;

        info!(user_id = user.id, telegram_id = telegram_id, "New user registered");
        Ok((user, true))
    }

    /// Get user by Telegram ID
    pub async fn get_by_telegram_id(&self, telegram_id: i64) -> Result<Option<UserProfile>> {
        self.user_repository.find_by_telegram_id(telegram_id).await
    }

    /// Set the delivery country; the currency follows from the country
    pub async fn set_country(&self, telegram_id: i64, country: &str) -> Result<UserProfile> {
        let existing = self.require(telegram_id).await?;

        let currency = country_currency(country);
        let user = self.user_repository.update(existing.id, UpdateUserRequest {
            country: Some(country.to_string()),
            currency: Some(currency.to_string()),
            ..Default::default()
        }).await?;

        info!(user_id = user.id, country = %country, currency = %currency, "Delivery country updated");
        Ok(user)
    }

    /// Set the interface language preference
    pub async fn set_language(&self, telegram_id: i64, language: &str) -> Result<UserProfile> {
        if !self.settings.i18n.supported_languages.iter().any(|l| l == language) {
            warn!(telegram_id = telegram_id, language = %language, "Unsupported language code");
            return Err(DealScoutError::InvalidInput(format!("Unsupported language: {}", language)));
        }

        let existing = self.require(telegram_id).await?;
        let user = self.user_repository.update(existing.id, UpdateUserRequest {
            language: Some(language.to_string()),
            ..Default::default()
        }).await?;

        Ok(user)
    }

    /// Flip the notification opt-in. The current value is read first and
    /// the inverse written, so a re-delivered callback never applies a
    /// blind mutation on top of a stale assumption.
    pub async fn toggle_notifications(&self, telegram_id: i64) -> Result<UserProfile> {
        let existing = self.require(telegram_id).await?;
        let user = self.user_repository
            .set_notifications(existing.id, !existing.notifications_enabled)
            .await?;

        info!(user_id = user.id, enabled = user.notifications_enabled, "Notification opt-in toggled");
        Ok(user)
    }

    /// Fetch a profile or fail with UserNotFound
    async fn require(&self, telegram_id: i64) -> Result<UserProfile> {
        self.user_repository
            .find_by_telegram_id(telegram_id)
            .await?
            .ok_or(DealScoutError::UserNotFound { user_id: telegram_id })
    }
}
