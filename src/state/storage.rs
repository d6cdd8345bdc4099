//! Search session storage
//!
//! The vendor pipeline is stateless per call; the router remembers the last
//! query and page per user here so a later "show more" callback can re-run
//! the search and slice the next window. Sessions live in Redis with a TTL.

use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use crate::config::RedisConfig;
use crate::models::product::QualityTier;
use crate::utils::errors::Result;

/// Pagination memory for one user's last search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSession {
    pub query: String,
    pub quality: QualityTier,
    pub max_price: Option<f64>,
    pub prefer_cheaper: bool,
    /// Zero-based page most recently shown
    pub page: usize,
    /// Items per page (5 conversational, 10 for the top-of-day view)
    pub page_size: usize,
    /// Whether the vendor reported more results past the shown page
    pub has_more: bool,
}

impl SearchSession {
    pub fn first_page(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            quality: QualityTier::Default,
            max_price: None,
            prefer_cheaper: false,
            page: 0,
            page_size: 5,
            has_more: false,
        }
    }
}

/// Redis-based session storage
#[derive(Clone)]
pub struct StateStorage {
    connection_manager: redis::aio::ConnectionManager,
    config: RedisConfig,
}

impl StateStorage {
    /// Create a new state storage instance
    pub async fn new(config: RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str())?;
        let connection_manager = redis::aio::ConnectionManager::new(client).await?;

        Ok(Self {
            connection_manager,
            config,
        })
    }

    /// Persist the user's current search session with the configured TTL
    pub async fn save_session(&self, user_id: i64, session: &SearchSession) -> Result<()> {
        let key = self.session_key(user_id);
        let serialized = serde_json::to_string(session)?;

        let mut conn = self.connection_manager.clone();
        conn.set_ex::<_, _, ()>(&key, serialized, self.config.ttl_seconds).await?;

        debug!(user_id = user_id, page = session.page, has_more = session.has_more,
               "Search session saved");
        Ok(())
    }

    /// Load the user's search session, if one is still alive
    pub async fn load_session(&self, user_id: i64) -> Result<Option<SearchSession>> {
        let key = self.session_key(user_id);
        let mut conn = self.connection_manager.clone();

        let data: Option<String> = conn.get(&key).await?;
        match data {
            Some(raw) => match serde_json::from_str::<SearchSession>(&raw) {
                Ok(session) => Ok(Some(session)),
                Err(e) => {
                    // Corrupted entry: drop it and behave as a miss
                    warn!(user_id = user_id, error = %e, "Discarding unreadable search session");
                    let _: () = conn.del(&key).await?;
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Forget the user's search session
    pub async fn clear_session(&self, user_id: i64) -> Result<()> {
        let key = self.session_key(user_id);
        let mut conn = self.connection_manager.clone();
        let _: () = conn.del(&key).await?;
        Ok(())
    }

    fn session_key(&self, user_id: i64) -> String {
        format!("{}search_session:{}", self.config.prefix, user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_roundtrip_serialization() {
        let session = SearchSession {
            query: "bluetooth headphones".to_string(),
            quality: QualityTier::High,
            max_price: Some(25.0),
            prefer_cheaper: true,
            page: 2,
            page_size: 5,
            has_more: true,
        };

        let serialized = serde_json::to_string(&session).unwrap();
        let deserialized: SearchSession = serde_json::from_str(&serialized).unwrap();

        assert_eq!(deserialized.query, session.query);
        assert_eq!(deserialized.quality, QualityTier::High);
        assert_eq!(deserialized.page, 2);
        assert!(deserialized.has_more);
    }

    #[test]
    fn test_first_page_defaults() {
        let session = SearchSession::first_page("socks");
        assert_eq!(session.page, 0);
        assert!(!session.has_more);
        assert_eq!(session.quality, QualityTier::Default);
    }
}
