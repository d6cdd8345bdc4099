//! Batch run audit models

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Append-only audit record of one batch fan-out run
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BroadcastLog {
    pub id: i64,
    /// Job identifier ("daily_top" or "price_drop")
    pub job: String,
    pub message: String,
    pub sent_count: i32,
    pub failed_count: i32,
    pub created_at: DateTime<Utc>,
}

/// Append-only search history entry
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SearchHistoryEntry {
    pub id: i64,
    pub user_id: i64,
    pub query: String,
    pub created_at: DateTime<Utc>,
}
