//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{DealScoutError, Result};
use super::Settings;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_bot_config(&settings.bot)?;
    validate_database_config(&settings.database)?;
    validate_redis_config(&settings.redis)?;
    validate_vendor_config(&settings.vendor)?;
    validate_jobs_config(&settings.jobs)?;
    validate_i18n_config(&settings.i18n)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate bot configuration
fn validate_bot_config(config: &super::BotConfig) -> Result<()> {
    if config.token.is_empty() {
        return Err(DealScoutError::Config(
            "Bot token is required".to_string()
        ));
    }

    if config.username.is_empty() {
        return Err(DealScoutError::Config(
            "Bot username is required for referral links".to_string()
        ));
    }

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(DealScoutError::Config(
            "Database URL is required".to_string()
        ));
    }

    if config.max_connections == 0 {
        return Err(DealScoutError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(DealScoutError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    Ok(())
}

/// Validate Redis configuration
fn validate_redis_config(config: &super::RedisConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(DealScoutError::Config(
            "Redis URL is required".to_string()
        ));
    }

    Ok(())
}

/// Validate vendor API configuration.
/// Credentials are intentionally not required here: an unconfigured vendor
/// degrades to empty search outcomes at call time.
fn validate_vendor_config(config: &super::VendorConfig) -> Result<()> {
    if config.api_url.is_empty() {
        return Err(DealScoutError::Config(
            "Vendor API URL is required".to_string()
        ));
    }

    if config.timeout_seconds == 0 {
        return Err(DealScoutError::Config(
            "Vendor timeout must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate batch job configuration
fn validate_jobs_config(config: &super::JobsConfig) -> Result<()> {
    if config.price_drop_threshold == 0 || config.price_drop_threshold > 100 {
        return Err(DealScoutError::Config(
            "Price drop threshold must be between 1 and 100 percent".to_string()
        ));
    }

    if config.broadcast_products == 0 {
        return Err(DealScoutError::Config(
            "Broadcast must include at least one product".to_string()
        ));
    }

    Ok(())
}

/// Validate internationalization configuration
fn validate_i18n_config(config: &super::I18nConfig) -> Result<()> {
    if config.default_language.is_empty() {
        return Err(DealScoutError::Config(
            "Default language is required".to_string()
        ));
    }

    if config.supported_languages.is_empty() {
        return Err(DealScoutError::Config(
            "At least one supported language is required".to_string()
        ));
    }

    if !config.supported_languages.contains(&config.default_language) {
        return Err(DealScoutError::Config(
            "Default language must be in supported languages list".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(DealScoutError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(DealScoutError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_vendor_credentials_are_accepted() {
        let mut settings = Settings::default();
        settings.bot.token = "123:token".to_string();
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_missing_bot_token_rejected() {
        let settings = Settings::default();
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_bad_price_drop_threshold_rejected() {
        let mut settings = Settings::default();
        settings.bot.token = "123:token".to_string();
        settings.jobs.price_drop_threshold = 0;
        assert!(validate_settings(&settings).is_err());
    }
}
