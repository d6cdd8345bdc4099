//! Reward coupon repository implementation

use sqlx::PgPool;
use chrono::Utc;
use crate::models::referral::RewardCoupon;
use crate::utils::errors::DealScoutError;

#[derive(Debug, Clone)]
pub struct CouponRepository {
    pool: PgPool,
}

impl CouponRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fast-path check before issuing; the (user_id, milestone) unique
    /// constraint remains the authoritative guard.
    pub async fn exists_for_milestone(&self, user_id: i64, milestone: i32) -> Result<bool, DealScoutError> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM coupons WHERE user_id = $1 AND milestone = $2)"
        )
        .bind(user_id)
        .bind(milestone)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    /// Insert a coupon for a milestone. Returns None when another
    /// evaluation already issued for this (user, milestone); concurrent
    /// or retried evaluation stays idempotent.
    pub async fn insert_for_milestone(
        &self,
        user_id: i64,
        code: &str,
        discount_percent: i32,
        milestone: i32,
    ) -> Result<Option<RewardCoupon>, DealScoutError> {
        let coupon = sqlx::query_as::<_, RewardCoupon>(
            r#"
            INSERT INTO coupons (user_id, code, discount_percent, milestone, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, milestone) DO NOTHING
            RETURNING id, user_id, code, discount_percent, milestone, created_at
            "#
        )
        .bind(user_id)
        .bind(code)
        .bind(discount_percent)
        .bind(milestone)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(coupon)
    }

    /// Whether a generated code is already taken (collision check before
    /// the retry-generate path)
    pub async fn code_exists(&self, code: &str) -> Result<bool, DealScoutError> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM coupons WHERE code = $1)"
        )
        .bind(code)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    /// All coupons earned by a user, oldest milestone first
    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<RewardCoupon>, DealScoutError> {
        let coupons = sqlx::query_as::<_, RewardCoupon>(
            "SELECT id, user_id, code, discount_percent, milestone, created_at \
             FROM coupons WHERE user_id = $1 ORDER BY milestone"
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(coupons)
    }
}
