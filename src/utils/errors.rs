//! Error handling for DealScout
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;

/// Main error type for the DealScout application
#[derive(Error, Debug)]
pub enum DealScoutError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("Vendor API error: {0}")]
    Vendor(#[from] VendorError),

    #[error("Translator error: {0}")]
    Translator(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: i64 },

    #[error("Referral code not found: {code}")]
    ReferralCodeNotFound { code: String },

    #[error("User {user_id} already has a referrer")]
    AlreadyReferred { user_id: i64 },

    #[error("Self-referral rejected for user {user_id}")]
    SelfReferral { user_id: i64 },

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Affiliate search API specific errors
#[derive(Error, Debug)]
pub enum VendorError {
    #[error("Vendor API request failed: {0}")]
    RequestFailed(String),

    #[error("Vendor API timeout")]
    Timeout,

    #[error("Invalid vendor response: {0}")]
    InvalidResponse(String),

    #[error("Vendor credentials not configured")]
    MissingCredentials,
}

/// Result type alias for DealScout operations
pub type Result<T> = std::result::Result<T, DealScoutError>;

/// Result type alias for vendor API operations
pub type VendorResult<T> = std::result::Result<T, VendorError>;

impl DealScoutError {
    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            DealScoutError::Database(_) => false,
            DealScoutError::Migration(_) => false,
            DealScoutError::Telegram(_) => true,
            DealScoutError::Vendor(_) => true,
            DealScoutError::Translator(_) => true,
            DealScoutError::Config(_) => false,
            DealScoutError::PermissionDenied(_) => false,
            DealScoutError::UserNotFound { .. } => false,
            DealScoutError::ReferralCodeNotFound { .. } => false,
            DealScoutError::AlreadyReferred { .. } => false,
            DealScoutError::SelfReferral { .. } => false,
            DealScoutError::Redis(_) => true,
            DealScoutError::Http(_) => true,
            DealScoutError::Serialization(_) => false,
            DealScoutError::Io(_) => true,
            DealScoutError::UrlParse(_) => false,
            DealScoutError::InvalidInput(_) => false,
            DealScoutError::ServiceUnavailable(_) => true,
        }
    }

    /// True for local denials that render as a friendly message,
    /// never as a system fault (duplicate referral, self-referral, bad input).
    pub fn is_user_denial(&self) -> bool {
        matches!(
            self,
            DealScoutError::ReferralCodeNotFound { .. }
                | DealScoutError::AlreadyReferred { .. }
                | DealScoutError::SelfReferral { .. }
                | DealScoutError::PermissionDenied(_)
                | DealScoutError::InvalidInput(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_errors_are_recoverable() {
        let err = DealScoutError::Vendor(VendorError::Timeout);
        assert!(err.is_recoverable());
        assert!(!err.is_user_denial());
    }

    #[test]
    fn test_referral_denials() {
        assert!(DealScoutError::SelfReferral { user_id: 1 }.is_user_denial());
        assert!(DealScoutError::AlreadyReferred { user_id: 1 }.is_user_denial());
        assert!(!DealScoutError::AlreadyReferred { user_id: 1 }.is_recoverable());
    }
}
