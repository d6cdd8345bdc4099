//! Referral and reward ledger service implementation
//!
//! Links referrer to referred exactly once at registration time, derives
//! referral counts from the edges, and issues milestone coupons
//! idempotently. Referrer notifications are fire-and-forget: a failed send
//! never rolls back an issued coupon.

use std::sync::Arc;
use chrono::Utc;
use rand::Rng;
use tracing::{debug, info, warn};
use crate::config::ReferralConfig;
use crate::database::repositories::{CouponRepository, ReferralRepository, UserRepository};
use crate::i18n::I18n;
use crate::models::referral::{milestones_reached, RewardCoupon};
use crate::models::user::UserProfile;
use crate::services::notification::OutboundDispatcher;
use crate::utils::errors::{DealScoutError, Result};
use crate::utils::helpers::to_base36;

#[derive(Clone)]
pub struct ReferralService {
    users: UserRepository,
    referrals: ReferralRepository,
    coupons: CouponRepository,
    dispatcher: Arc<dyn OutboundDispatcher>,
    i18n: I18n,
    config: ReferralConfig,
    bot_username: String,
}

/// Summary returned for the profile / referral views
#[derive(Debug, Clone)]
pub struct ReferralStats {
    pub code: String,
    pub link: String,
    pub referral_count: i64,
    pub coupons: Vec<RewardCoupon>,
}

impl ReferralService {
    pub fn new(
        users: UserRepository,
        referrals: ReferralRepository,
        coupons: CouponRepository,
        dispatcher: Arc<dyn OutboundDispatcher>,
        i18n: I18n,
        config: ReferralConfig,
        bot_username: String,
    ) -> Self {
        Self {
            users,
            referrals,
            coupons,
            dispatcher,
            i18n,
            config,
            bot_username,
        }
    }

    /// Referral code, invite link, edge count and earned coupons for a user.
    /// The code is generated lazily on first request.
    pub async fn stats(&self, user: &UserProfile) -> Result<ReferralStats> {
        let code = match &user.referral_code {
            Some(code) => code.clone(),
            None => {
                let code = referral_code(&self.config.code_prefix, user.telegram_id);
                self.users.set_referral_code(user.id, &code).await?;
                debug!(user_id = user.id, code = %code, "Generated referral code");
                code
            }
        };

        let referral_count = self.referrals.count_for_referrer(user.id).await?;
        let coupons = self.coupons.list_for_user(user.id).await?;

        Ok(ReferralStats {
            link: format!("https://t.me/{}?start={}", self.bot_username, code),
            code,
            referral_count,
            coupons,
        })
    }

    /// Link a freshly registered user to the owner of `code` and evaluate
    /// reward milestones. Returns the referrer's display name.
    ///
    /// Denials (unknown code, self-referral, already linked) surface as
    /// typed errors for the router to render; they are not system faults.
    pub async fn process_referral(&self, new_user: &UserProfile, code: &str) -> Result<String> {
        let referrer = self.users.find_by_referral_code(code).await?
            .ok_or_else(|| DealScoutError::ReferralCodeNotFound { code: code.to_string() })?;

        if referrer.id == new_user.id {
            return Err(DealScoutError::SelfReferral { user_id: new_user.id });
        }

        if self.referrals.exists_for_referred(new_user.id).await? {
            return Err(DealScoutError::AlreadyReferred { user_id: new_user.id });
        }

        // The unique index on referred_id backstops the check above under
        // a duplicate delivery race
        let link = self.referrals.insert(referrer.id, new_user.id).await?;
        if link.is_none() {
            return Err(DealScoutError::AlreadyReferred { user_id: new_user.id });
        }

        self.users.set_referred_by(new_user.id, referrer.id).await?;
        info!(referrer_id = referrer.id, referred_id = new_user.id, "Referral link recorded");

        let referral_count = self.referrals.count_for_referrer(referrer.id).await?;
        self.evaluate_milestones(&referrer, referral_count).await?;

        Ok(referrer.display_name().to_string())
    }

    /// Issue coupons for every milestone at or below the current count.
    /// Issuance is idempotent per (user, milestone); only an actual insert
    /// notifies the referrer.
    async fn evaluate_milestones(&self, referrer: &UserProfile, referral_count: i64) -> Result<()> {
        for (milestone, percent) in milestones_reached(referral_count) {
            // Fast path; the (user_id, milestone) unique constraint is the
            // authoritative guard
            if self.coupons.exists_for_milestone(referrer.id, milestone as i32).await? {
                continue;
            }

            if let Some(coupon) = self.issue_coupon(referrer, milestone as i32, percent).await? {
                self.users.add_reward_points(referrer.id, coupon.discount_percent).await?;
                self.notify_referrer(referrer, &coupon, referral_count);
            }
        }

        Ok(())
    }

    /// Insert one milestone coupon, regenerating the code once on a code
    /// collision. Returns None when another evaluation got there first.
    async fn issue_coupon(
        &self,
        referrer: &UserProfile,
        milestone: i32,
        percent: i32,
    ) -> Result<Option<RewardCoupon>> {
        let millis = Utc::now().timestamp_millis().max(0) as u64;
        let mut code = coupon_code(&self.config.coupon_prefix, percent, referrer.telegram_id, millis, None);

        if self.coupons.code_exists(&code).await? {
            let jitter = rand::thread_rng().gen_range(0..1296u32);
            code = coupon_code(&self.config.coupon_prefix, percent, referrer.telegram_id, millis, Some(jitter));
        }

        let coupon = self.coupons
            .insert_for_milestone(referrer.id, &code, percent, milestone)
            .await?;

        if let Some(coupon) = &coupon {
            info!(user_id = referrer.id, milestone = milestone, code = %coupon.code, "Reward coupon issued");
        }
        Ok(coupon)
    }

    /// Fire-and-forget referrer notification
    fn notify_referrer(&self, referrer: &UserProfile, coupon: &RewardCoupon, referral_count: i64) {
        let dispatcher = Arc::clone(&self.dispatcher);
        let chat_id = referrer.telegram_id;
        let lang = referrer.language.clone();
        let i18n = self.i18n.clone();

        let mut params = std::collections::HashMap::new();
        params.insert("percent".to_string(), coupon.discount_percent.to_string());
        params.insert("code".to_string(), coupon.code.clone());
        params.insert("count".to_string(), referral_count.to_string());

        tokio::spawn(async move {
            let text = i18n.t("referral.coupon_earned", &lang, Some(&params));
            if let Err(e) = dispatcher.send_text(chat_id, &text, None).await {
                warn!(chat_id = chat_id, error = %e, "Referrer notification failed (best-effort)");
            }
        });
    }
}

/// Stable per-user referral code: prefix + base36 of the Telegram id
pub fn referral_code(prefix: &str, telegram_id: i64) -> String {
    format!("{}{}", prefix, to_base36(telegram_id.max(0) as u64)).to_uppercase()
}

/// Coupon code: `{prefix}{percent}-{userId}-{base36 timestamp}`, with an
/// optional jitter suffix for the collision retry
pub fn coupon_code(prefix: &str, percent: i32, telegram_id: i64, millis: u64, jitter: Option<u32>) -> String {
    let base = format!("{}{}-{}-{}", prefix, percent, telegram_id, to_base36(millis));
    match jitter {
        Some(j) => format!("{}{}", base, to_base36(j as u64)).to_uppercase(),
        None => base.to_uppercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_referral_code_is_stable_and_prefixed() {
        let a = referral_code("DS", 123456789);
        let b = referral_code("DS", 123456789);
        assert_eq!(a, b);
        assert!(a.starts_with("DS"));
        assert_ne!(a, referral_code("DS", 987654321));
    }

    #[test]
    fn test_coupon_code_shape() {
        let code = coupon_code("DEAL", 5, 42, 1_700_000_000_000, None);
        assert!(code.starts_with("DEAL5-42-"));
        assert_eq!(code, code.to_uppercase());
    }

    #[test]
    fn test_coupon_code_jitter_differs() {
        let plain = coupon_code("DEAL", 5, 42, 1_700_000_000_000, None);
        let jittered = coupon_code("DEAL", 5, 42, 1_700_000_000_000, Some(7));
        assert_ne!(plain, jittered);
        assert!(jittered.starts_with(&plain));
    }
}
