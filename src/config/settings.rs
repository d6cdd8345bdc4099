//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub bot: BotConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub vendor: VendorConfig,
    pub translator: TranslatorConfig,
    pub referral: ReferralConfig,
    pub jobs: JobsConfig,
    pub i18n: I18nConfig,
    pub logging: LoggingConfig,
    pub features: FeaturesConfig,
}

/// Telegram bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BotConfig {
    pub token: String,
    pub username: String,
    pub admin_ids: Vec<i64>,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Redis configuration (search session storage)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedisConfig {
    pub url: String,
    pub prefix: String,
    pub ttl_seconds: u64,
}

/// Affiliate search API configuration.
/// Credentials may be empty: the pipeline degrades to an unsuccessful
/// outcome at call time instead of failing validation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VendorConfig {
    pub api_url: String,
    pub app_key: String,
    pub app_secret: String,
    pub tracking_id: Option<String>,
    pub timeout_seconds: u64,
}

/// Generative-text translator configuration (OpenAI-compatible endpoint)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TranslatorConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_seconds: u64,
}

/// Referral program configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReferralConfig {
    pub code_prefix: String,
    pub coupon_prefix: String,
}

/// Batch job configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JobsConfig {
    /// Delay between consecutive outbound sends, in milliseconds
    pub send_delay_ms: u64,
    /// Minimum price drop (percent) that triggers a notification
    pub price_drop_threshold: u32,
    /// Products per recipient in the daily broadcast
    pub broadcast_products: usize,
}

/// Internationalization configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct I18nConfig {
    pub default_language: String,
    pub supported_languages: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: String,
}

/// Feature flags configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeaturesConfig {
    pub daily_broadcast: bool,
    pub price_watch: bool,
    pub admin_panel: bool,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("DEALSCOUT"))
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::DealScoutError> {
        super::validation::validate_settings(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                token: String::new(),
                username: "DealScoutBot".to_string(),
                admin_ids: vec![],
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/dealscout".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            redis: RedisConfig {
                url: "redis://localhost:6379".to_string(),
                prefix: "dealscout:".to_string(),
                ttl_seconds: 3600,
            },
            vendor: VendorConfig {
                api_url: "https://api-sg.aliexpress.com/sync".to_string(),
                app_key: String::new(),
                app_secret: String::new(),
                tracking_id: None,
                timeout_seconds: 10,
            },
            translator: TranslatorConfig {
                base_url: "https://api.openai.com/v1".to_string(),
                api_key: String::new(),
                model: "gpt-4o-mini".to_string(),
                timeout_seconds: 5,
            },
            referral: ReferralConfig {
                code_prefix: "DS".to_string(),
                coupon_prefix: "DEAL".to_string(),
            },
            jobs: JobsConfig {
                send_delay_ms: 200,
                price_drop_threshold: 5,
                broadcast_products: 5,
            },
            i18n: I18nConfig {
                default_language: "en".to_string(),
                supported_languages: vec!["en".to_string(), "uk".to_string(), "de".to_string()],
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: "/var/log/dealscout".to_string(),
            },
            features: FeaturesConfig {
                daily_broadcast: true,
                price_watch: true,
                admin_panel: true,
            },
        }
    }
}
