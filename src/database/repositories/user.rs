//! User profile repository implementation

use sqlx::PgPool;
use chrono::Utc;
use crate::models::user::{UserProfile, CreateUserRequest, UpdateUserRequest};
use crate::utils::errors::DealScoutError;

const PROFILE_COLUMNS: &str = "id, telegram_id, username, first_name, language, country, currency, \
     notifications_enabled, referral_code, referred_by, reward_points, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user profile. Country and currency start empty / USD
    /// until the user picks a delivery country.
    pub async fn create(&self, request: CreateUserRequest) -> Result<UserProfile, DealScoutError> {
        let user = sqlx::query_as::<_, UserProfile>(
            r#"
            INSERT INTO users (telegram_id, username, first_name, language, country, currency,
                               notifications_enabled, reward_points, created_at, updated_at)
            VALUES ($1, $2, $3, $4, '', 'USD', TRUE, 0, $5, $5)
            RETURNING id, telegram_id, username, first_name, language, country, currency,
                      notifications_enabled, referral_code, referred_by, reward_points,
                      created_at, updated_at
            "#
        )
        .bind(request.telegram_id)
        .bind(request.username)
        .bind(request.first_name)
        .bind(request.language.unwrap_or_else(|| "en".to_string()))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find user by internal ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<UserProfile>, DealScoutError> {
        let user = sqlx::query_as::<_, UserProfile>(
            &format!("SELECT {} FROM users WHERE id = $1", PROFILE_COLUMNS)
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find user by Telegram ID
    pub async fn find_by_telegram_id(&self, telegram_id: i64) -> Result<Option<UserProfile>, DealScoutError> {
        let user = sqlx::query_as::<_, UserProfile>(
            &format!("SELECT {} FROM users WHERE telegram_id = $1", PROFILE_COLUMNS)
        )
        .bind(telegram_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find user by referral code
    pub async fn find_by_referral_code(&self, code: &str) -> Result<Option<UserProfile>, DealScoutError> {
        let user = sqlx::query_as::<_, UserProfile>(
            &format!("SELECT {} FROM users WHERE referral_code = $1", PROFILE_COLUMNS)
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Update profile fields; absent fields keep their current value
    pub async fn update(&self, id: i64, request: UpdateUserRequest) -> Result<UserProfile, DealScoutError> {
        let user = sqlx::query_as::<_, UserProfile>(
            r#"
            UPDATE users
            SET username = COALESCE($2, username),
                first_name = COALESCE($3, first_name),
                language = COALESCE($4, language),
                country = COALESCE($5, country),
                currency = COALESCE($6, currency),
                updated_at = $7
            WHERE id = $1
            RETURNING id, telegram_id, username, first_name, language, country, currency,
                      notifications_enabled, referral_code, referred_by, reward_points,
                      created_at, updated_at
            "#
        )
        .bind(id)
        .bind(request.username)
        .bind(request.first_name)
        .bind(request.language)
        .bind(request.country)
        .bind(request.currency)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Flip the notification opt-in as a single conditional update and
    /// return the new value. Read-before-write lives in the SQL itself so
    /// a duplicate delivery never applies a blind increment.
    pub async fn set_notifications(&self, id: i64, enabled: bool) -> Result<UserProfile, DealScoutError> {
        let user = sqlx::query_as::<_, UserProfile>(
            r#"
            UPDATE users
            SET notifications_enabled = $2, updated_at = $3
            WHERE id = $1
            RETURNING id, telegram_id, username, first_name, language, country, currency,
                      notifications_enabled, referral_code, referred_by, reward_points,
                      created_at, updated_at
            "#
        )
        .bind(id)
        .bind(enabled)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Store a lazily generated referral code; only fills an empty slot
    pub async fn set_referral_code(&self, id: i64, code: &str) -> Result<(), DealScoutError> {
        sqlx::query(
            "UPDATE users SET referral_code = $2, updated_at = $3 WHERE id = $1 AND referral_code IS NULL"
        )
        .bind(id)
        .bind(code)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Record the weak back-reference to the referrer; set at most once
    pub async fn set_referred_by(&self, id: i64, referrer_id: i64) -> Result<(), DealScoutError> {
        sqlx::query(
            "UPDATE users SET referred_by = $2, updated_at = $3 WHERE id = $1 AND referred_by IS NULL"
        )
        .bind(id)
        .bind(referrer_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Add reward points accrued from coupon issuance
    pub async fn add_reward_points(&self, id: i64, points: i32) -> Result<(), DealScoutError> {
        sqlx::query(
            "UPDATE users SET reward_points = reward_points + $2, updated_at = $3 WHERE id = $1"
        )
        .bind(id)
        .bind(points)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Recipients for the daily broadcast: opted in, with a chosen country
    pub async fn list_notifiable(&self) -> Result<Vec<UserProfile>, DealScoutError> {
        let users = sqlx::query_as::<_, UserProfile>(
            &format!(
                "SELECT {} FROM users WHERE notifications_enabled = TRUE AND country <> '' ORDER BY id",
                PROFILE_COLUMNS
            )
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Count total users
    pub async fn count(&self) -> Result<i64, DealScoutError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    /// User counts grouped by country, for the admin stats view
    pub async fn count_by_country(&self) -> Result<Vec<(String, i64)>, DealScoutError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT country, COUNT(*) FROM users WHERE country <> '' GROUP BY country ORDER BY COUNT(*) DESC"
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// User counts grouped by language, for the admin stats view
    pub async fn count_by_language(&self) -> Result<Vec<(String, i64)>, DealScoutError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT language, COUNT(*) FROM users GROUP BY language ORDER BY COUNT(*) DESC"
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
