//! Referral edge repository implementation
//!
//! Referral counts are always derived by counting edges rather than kept in
//! a denormalized column, so the count can never drift from the edges.

use sqlx::PgPool;
use chrono::Utc;
use crate::models::referral::ReferralLink;
use crate::utils::errors::DealScoutError;

#[derive(Debug, Clone)]
pub struct ReferralRepository {
    pool: PgPool,
}

impl ReferralRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert the referrer -> referred edge. The unique index on
    /// referred_id is the backstop against double-linking; a conflicting
    /// insert returns None.
    pub async fn insert(&self, referrer_id: i64, referred_id: i64) -> Result<Option<ReferralLink>, DealScoutError> {
        let link = sqlx::query_as::<_, ReferralLink>(
            r#"
            INSERT INTO referrals (referrer_id, referred_id, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (referred_id) DO NOTHING
            RETURNING id, referrer_id, referred_id, created_at
            "#
        )
        .bind(referrer_id)
        .bind(referred_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(link)
    }

    /// Whether the user already has a referrer
    pub async fn exists_for_referred(&self, referred_id: i64) -> Result<bool, DealScoutError> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM referrals WHERE referred_id = $1)"
        )
        .bind(referred_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    /// Number of users this referrer has brought in (edge count)
    pub async fn count_for_referrer(&self, referrer_id: i64) -> Result<i64, DealScoutError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM referrals WHERE referrer_id = $1"
        )
        .bind(referrer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }
}
