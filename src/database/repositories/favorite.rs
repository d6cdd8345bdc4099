//! Favorite item repository implementation

use sqlx::PgPool;
use chrono::Utc;
use crate::models::favorite::{FavoriteItem, NewFavorite};
use crate::models::user::UserProfile;
use crate::utils::errors::DealScoutError;

#[derive(Debug, Clone)]
pub struct FavoriteRepository {
    pool: PgPool,
}

impl FavoriteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List a user's favorites, newest first
    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<FavoriteItem>, DealScoutError> {
        let favorites = sqlx::query_as::<_, FavoriteItem>(
            r#"
            SELECT id, user_id, product_id, title, product_url, image_url,
                   price_at_add, last_price, currency, created_at
            FROM favorites WHERE user_id = $1 ORDER BY created_at DESC
            "#
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(favorites)
    }

    /// Look up one favorite by owner and vendor product id
    pub async fn find(&self, user_id: i64, product_id: &str) -> Result<Option<FavoriteItem>, DealScoutError> {
        let favorite = sqlx::query_as::<_, FavoriteItem>(
            r#"
            SELECT id, user_id, product_id, title, product_url, image_url,
                   price_at_add, last_price, currency, created_at
            FROM favorites WHERE user_id = $1 AND product_id = $2
            "#
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(favorite)
    }

    /// Insert a favorite. A duplicate delivery racing past the handler's
    /// read lands on the (user_id, product_id) unique constraint and
    /// returns None instead of erroring.
    pub async fn insert(&self, favorite: NewFavorite) -> Result<Option<FavoriteItem>, DealScoutError> {
        let created = sqlx::query_as::<_, FavoriteItem>(
            r#"
            INSERT INTO favorites (user_id, product_id, title, product_url, image_url,
                                   price_at_add, last_price, currency, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6, $7, $8)
            ON CONFLICT (user_id, product_id) DO NOTHING
            RETURNING id, user_id, product_id, title, product_url, image_url,
                      price_at_add, last_price, currency, created_at
            "#
        )
        .bind(favorite.user_id)
        .bind(favorite.product_id)
        .bind(favorite.title)
        .bind(favorite.product_url)
        .bind(favorite.image_url)
        .bind(favorite.price)
        .bind(favorite.currency)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(created)
    }

    pub async fn delete(&self, id: i64) -> Result<(), DealScoutError> {
        sqlx::query("DELETE FROM favorites WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Record the price observed by the price-drop sweep
    pub async fn update_last_price(&self, id: i64, price: f64) -> Result<(), DealScoutError> {
        sqlx::query("UPDATE favorites SET last_price = $2 WHERE id = $1")
            .bind(id)
            .bind(price)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// All favorites with a positive observed price, joined with their
    /// owners, for the price-drop sweep
    pub async fn list_all_with_owners(&self) -> Result<Vec<(FavoriteItem, UserProfile)>, DealScoutError> {
        let rows = sqlx::query_as::<_, FavoriteWithOwner>(
            r#"
            SELECT f.id, f.user_id, f.product_id, f.title, f.product_url, f.image_url,
                   f.price_at_add, f.last_price, f.currency, f.created_at,
                   u.id AS owner_id, u.telegram_id, u.username, u.first_name, u.language,
                   u.country, u.currency AS owner_currency, u.notifications_enabled,
                   u.referral_code, u.referred_by, u.reward_points,
                   u.created_at AS owner_created_at, u.updated_at AS owner_updated_at
            FROM favorites f
            INNER JOIN users u ON u.id = f.user_id
            WHERE f.last_price > 0
            ORDER BY f.id
            "#
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(FavoriteWithOwner::split).collect())
    }
}

/// Flattened join row for `list_all_with_owners`
#[derive(sqlx::FromRow)]
struct FavoriteWithOwner {
    id: i64,
    user_id: i64,
    product_id: String,
    title: String,
    product_url: String,
    image_url: Option<String>,
    price_at_add: f64,
    last_price: f64,
    currency: String,
    created_at: chrono::DateTime<Utc>,
    owner_id: i64,
    telegram_id: i64,
    username: Option<String>,
    first_name: Option<String>,
    language: String,
    country: String,
    owner_currency: String,
    notifications_enabled: bool,
    referral_code: Option<String>,
    referred_by: Option<i64>,
    reward_points: i32,
    owner_created_at: chrono::DateTime<Utc>,
    owner_updated_at: chrono::DateTime<Utc>,
}

impl FavoriteWithOwner {
    fn split(self) -> (FavoriteItem, UserProfile) {
        (
            FavoriteItem {
                id: self.id,
                user_id: self.user_id,
                product_id: self.product_id,
                title: self.title,
                product_url: self.product_url,
                image_url: self.image_url,
                price_at_add: self.price_at_add,
                last_price: self.last_price,
                currency: self.currency,
                created_at: self.created_at,
            },
            UserProfile {
                id: self.owner_id,
                telegram_id: self.telegram_id,
                username: self.username,
                first_name: self.first_name,
                language: self.language,
                country: self.country,
                currency: self.owner_currency,
                notifications_enabled: self.notifications_enabled,
                referral_code: self.referral_code,
                referred_by: self.referred_by,
                reward_points: self.reward_points,
                created_at: self.owner_created_at,
                updated_at: self.owner_updated_at,
            },
        )
    }
}
