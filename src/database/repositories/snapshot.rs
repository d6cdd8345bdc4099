//! Product snapshot repository implementation
//!
//! Durable fallback behind the in-memory snapshot cache. Writes race and
//! the last writer wins; snapshots are immutable-in-practice per item id.

use sqlx::PgPool;
use chrono::Utc;
use crate::models::product::ProductSnapshot;
use crate::utils::errors::DealScoutError;

#[derive(Debug, Clone)]
pub struct SnapshotRepository {
    pool: PgPool,
}

impl SnapshotRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn upsert(&self, snapshot: &ProductSnapshot) -> Result<(), DealScoutError> {
        sqlx::query(
            r#"
            INSERT INTO product_snapshots (product_id, title, product_url, image_url, price, currency, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (product_id) DO UPDATE
            SET title = EXCLUDED.title,
                product_url = EXCLUDED.product_url,
                image_url = EXCLUDED.image_url,
                price = EXCLUDED.price,
                currency = EXCLUDED.currency
            "#
        )
        .bind(&snapshot.product_id)
        .bind(&snapshot.title)
        .bind(&snapshot.product_url)
        .bind(&snapshot.image_url)
        .bind(snapshot.price)
        .bind(&snapshot.currency)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn find(&self, product_id: &str) -> Result<Option<ProductSnapshot>, DealScoutError> {
        let snapshot = sqlx::query_as::<_, ProductSnapshot>(
            "SELECT product_id, title, product_url, image_url, price, currency \
             FROM product_snapshots WHERE product_id = $1"
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(snapshot)
    }
}
