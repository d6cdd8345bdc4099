//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod user;
pub mod favorite;
pub mod product;
pub mod referral;
pub mod broadcast;
pub mod event;

// Re-export commonly used models
pub use user::{UserProfile, CreateUserRequest, UpdateUserRequest};
pub use favorite::{FavoriteItem, NewFavorite};
pub use product::{Product, ProductSnapshot, QualityTier, SearchRequest, SearchOutcome};
pub use referral::{ReferralLink, RewardCoupon, REWARD_MILESTONES, milestones_reached};
pub use broadcast::{BroadcastLog, SearchHistoryEntry};
pub use event::{ChatEvent, Response, KeyboardKind};
