//! Search history repository implementation

use sqlx::PgPool;
use chrono::Utc;
use crate::models::broadcast::SearchHistoryEntry;
use crate::utils::errors::DealScoutError;

#[derive(Debug, Clone)]
pub struct SearchHistoryRepository {
    pool: PgPool,
}

impl SearchHistoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append one query to the user's history
    pub async fn record(&self, user_id: i64, query: &str) -> Result<SearchHistoryEntry, DealScoutError> {
        let entry = sqlx::query_as::<_, SearchHistoryEntry>(
            r#"
            INSERT INTO search_history (user_id, query, created_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, query, created_at
            "#
        )
        .bind(user_id)
        .bind(query)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Most recent entries, newest first, capped to a small window
    pub async fn recent(&self, user_id: i64, limit: i64) -> Result<Vec<SearchHistoryEntry>, DealScoutError> {
        let entries = sqlx::query_as::<_, SearchHistoryEntry>(
            "SELECT id, user_id, query, created_at FROM search_history \
             WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2"
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Fetch one entry, scoped to its owner (used by the repeat callback)
    pub async fn find(&self, user_id: i64, entry_id: i64) -> Result<Option<SearchHistoryEntry>, DealScoutError> {
        let entry = sqlx::query_as::<_, SearchHistoryEntry>(
            "SELECT id, user_id, query, created_at FROM search_history WHERE id = $1 AND user_id = $2"
        )
        .bind(entry_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }
}
