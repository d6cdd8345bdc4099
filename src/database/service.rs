//! Database service layer
//!
//! This module provides a high-level interface to database operations

use crate::database::{
    DatabasePool, UserRepository, FavoriteRepository, SearchHistoryRepository,
    ReferralRepository, CouponRepository, SnapshotRepository, BroadcastRepository,
};

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pub users: UserRepository,
    pub favorites: FavoriteRepository,
    pub history: SearchHistoryRepository,
    pub referrals: ReferralRepository,
    pub coupons: CouponRepository,
    pub snapshots: SnapshotRepository,
    pub broadcasts: BroadcastRepository,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            favorites: FavoriteRepository::new(pool.clone()),
            history: SearchHistoryRepository::new(pool.clone()),
            referrals: ReferralRepository::new(pool.clone()),
            coupons: CouponRepository::new(pool.clone()),
            snapshots: SnapshotRepository::new(pool.clone()),
            broadcasts: BroadcastRepository::new(pool),
        }
    }
}
