//! Referral edge and reward coupon models

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Immutable referrer -> referred edge. A referred user appears at most
/// once across all edges; self-referral is rejected before insertion.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReferralLink {
    pub id: i64,
    pub referrer_id: i64,
    pub referred_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RewardCoupon {
    pub id: i64,
    pub user_id: i64,
    pub code: String,
    pub discount_percent: i32,
    /// Referral-count milestone that earned this coupon; at most one
    /// coupon exists per (user, milestone)
    pub milestone: i32,
    pub created_at: DateTime<Utc>,
}

/// Milestone table: referral count -> coupon discount percent,
/// ascending order.
pub const REWARD_MILESTONES: [(i64, i32); 4] = [(1, 3), (3, 5), (5, 10), (10, 15)];

/// Milestones reached at or below the given referral count
pub fn milestones_reached(referral_count: i64) -> Vec<(i64, i32)> {
    REWARD_MILESTONES
        .iter()
        .copied()
        .filter(|(count, _)| *count <= referral_count)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_milestones_reached() {
        assert!(milestones_reached(0).is_empty());
        assert_eq!(milestones_reached(1), vec![(1, 3)]);
        assert_eq!(milestones_reached(4), vec![(1, 3), (3, 5)]);
        assert_eq!(milestones_reached(10), vec![(1, 3), (3, 5), (5, 10), (10, 15)]);
    }

    #[test]
    fn test_milestones_are_ascending() {
        let counts: Vec<i64> = REWARD_MILESTONES.iter().map(|(c, _)| *c).collect();
        let mut sorted = counts.clone();
        sorted.sort_unstable();
        assert_eq!(counts, sorted);
    }
}
