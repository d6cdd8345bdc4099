//! Database repositories module
//!
//! Contains repository implementations for all data access operations

pub mod user;
pub mod favorite;
pub mod history;
pub mod referral;
pub mod coupon;
pub mod snapshot;
pub mod broadcast;

pub use user::UserRepository;
pub use favorite::FavoriteRepository;
pub use history::SearchHistoryRepository;
pub use referral::ReferralRepository;
pub use coupon::CouponRepository;
pub use snapshot::SnapshotRepository;
pub use broadcast::BroadcastRepository;
