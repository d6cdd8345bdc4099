//! User profile model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub id: i64,
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub language: String,
    pub country: String,
    pub currency: String,
    pub notifications_enabled: bool,
    pub referral_code: Option<String>,
    pub referred_by: Option<i64>,
    pub reward_points: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// A profile is usable by the search pipeline only once the country
    /// (and with it the currency) has been selected.
    pub fn has_country(&self) -> bool {
        !self.country.is_empty()
    }

    /// Display name for greetings and referral notifications
    pub fn display_name(&self) -> &str {
        self.first_name
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or("friend")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub language: Option<String>,
    pub country: Option<String>,
    pub currency: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> UserProfile {
        UserProfile {
            id: 1,
            telegram_id: 42,
            username: Some("deal_hunter".to_string()),
            first_name: None,
            language: "en".to_string(),
            country: String::new(),
            currency: "USD".to_string(),
            notifications_enabled: true,
            referral_code: None,
            referred_by: None,
            reward_points: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_has_country() {
        let mut p = profile();
        assert!(!p.has_country());
        p.country = "Germany".to_string();
        assert!(p.has_country());
    }

    #[test]
    fn test_display_name_fallback() {
        let mut p = profile();
        assert_eq!(p.display_name(), "deal_hunter");
        p.first_name = Some("Olha".to_string());
        assert_eq!(p.display_name(), "Olha");
        p.first_name = None;
        p.username = None;
        assert_eq!(p.display_name(), "friend");
    }
}
