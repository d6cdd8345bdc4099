//! Broadcast log repository implementation
//!
//! Write-only from the batch fan-out engine; each run appends one row.

use sqlx::PgPool;
use chrono::Utc;
use crate::models::broadcast::BroadcastLog;
use crate::utils::errors::DealScoutError;

#[derive(Debug, Clone)]
pub struct BroadcastRepository {
    pool: PgPool,
}

impl BroadcastRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn record(
        &self,
        job: &str,
        message: &str,
        sent_count: i32,
        failed_count: i32,
    ) -> Result<BroadcastLog, DealScoutError> {
        let log = sqlx::query_as::<_, BroadcastLog>(
            r#"
            INSERT INTO broadcast_log (job, message, sent_count, failed_count, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, job, message, sent_count, failed_count, created_at
            "#
        )
        .bind(job)
        .bind(message)
        .bind(sent_count)
        .bind(failed_count)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(log)
    }
}
