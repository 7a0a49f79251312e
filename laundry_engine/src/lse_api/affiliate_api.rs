use std::fmt::Debug;

use chrono::Utc;
use laundry_common::{Money, Percent};
use log::*;
use serde_json::json;

use crate::{
    calculators::commission::{current_level, effective_rate, next_level},
    config::CommissionRules,
    db::traits::AffiliateManagement,
    db_types::{
        AffiliateClientLink,
        AffiliateLevel,
        AffiliateProfile,
        AffiliateStatus,
        CommissionStatus,
        CommissionTransaction,
        NewAffiliate,
        NewAffiliateClientLink,
        NewAffiliateLevel,
    },
    events::{EventProducers, NotificationEvent, NotificationType},
    lse_api::{
        affiliate_objects::{AffiliateSummary, CommissionCredit},
        errors::EngineError,
    },
};

/// Affiliate registration and review, the level table, commission credits outside settlement, and withdrawals.
pub struct AffiliateApi<B> {
    db: B,
    producers: EventProducers,
    rules: CommissionRules,
    min_withdrawal: Money,
}

impl<B> Debug for AffiliateApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AffiliateApi (min withdrawal: {})", self.min_withdrawal)
    }
}

impl<B> AffiliateApi<B> {
    pub fn new(db: B, producers: EventProducers, rules: CommissionRules, min_withdrawal: Money) -> Self {
        Self { db, producers, rules, min_withdrawal }
    }
}

impl<B> AffiliateApi<B>
where B: AffiliateManagement
{
    /// Registers a new affiliate. It starts out `PENDING` and earns nothing until it is activated.
    pub async fn register(&self, affiliate: NewAffiliate) -> Result<AffiliateProfile, EngineError> {
        self.db.insert_affiliate(affiliate).await
    }

    pub async fn set_status(&self, affiliate_id: i64, status: AffiliateStatus) -> Result<AffiliateProfile, EngineError> {
        self.db.update_affiliate_status(affiliate_id, status).await
    }

    pub async fn activate(&self, affiliate_id: i64) -> Result<AffiliateProfile, EngineError> {
        self.set_status(affiliate_id, AffiliateStatus::Active).await
    }

    pub async fn suspend(&self, affiliate_id: i64) -> Result<AffiliateProfile, EngineError> {
        self.set_status(affiliate_id, AffiliateStatus::Suspended).await
    }

    /// Refused with [`EngineError::ValidationError`] if `parent_id` is the affiliate itself or one of its descendants.
    pub async fn set_parent(&self, affiliate_id: i64, parent_id: Option<i64>) -> Result<AffiliateProfile, EngineError> {
        self.db.assign_parent_affiliate(affiliate_id, parent_id).await
    }

    pub async fn add_level(&self, level: NewAffiliateLevel) -> Result<AffiliateLevel, EngineError> {
        if level.min_referrals < 0 {
            return Err(EngineError::invalid("A level cannot require a negative number of referrals"));
        }
        if level.commission_rate < Percent::ZERO || level.commission_rate > Percent::HUNDRED {
            return Err(EngineError::invalid(format!("Commission rate {} is out of range", level.commission_rate)));
        }
        self.db.insert_affiliate_level(level).await
    }

    pub async fn levels(&self) -> Result<Vec<AffiliateLevel>, EngineError> {
        self.db.fetch_affiliate_levels().await
    }

    /// Credits commission on an order to the affiliate owning `code` and its ancestors.
    pub async fn credit_commission(
        &self,
        order_id: i64,
        order_amount: Money,
        code: &str,
    ) -> Result<Vec<CommissionCredit>, EngineError> {
        let credits = self.db.credit_commission(order_id, order_amount, code, &self.rules).await?;
        debug!("💸️ {} commission credits written for order #{order_id}", credits.len());
        Ok(credits)
    }

    /// Requests a withdrawal of `amount` from the affiliate's commission balance. The amount must be at least the
    /// configured minimum and covered by the balance.
    pub async fn request_withdrawal(&self, affiliate_id: i64, amount: Money) -> Result<CommissionTransaction, EngineError> {
        if amount < self.min_withdrawal {
            return Err(EngineError::invalid(format!(
                "The minimum withdrawal is {}, but {amount} was requested",
                self.min_withdrawal
            )));
        }
        let withdrawal = self.db.request_withdrawal(affiliate_id, amount).await?;
        self.notify_withdrawal(&withdrawal, NotificationType::WithdrawalRequested).await;
        Ok(withdrawal)
    }

    pub async fn approve_withdrawal(&self, withdrawal_id: i64) -> Result<CommissionTransaction, EngineError> {
        let withdrawal = self.db.approve_withdrawal(withdrawal_id).await?;
        self.notify_withdrawal(&withdrawal, NotificationType::WithdrawalApproved).await;
        Ok(withdrawal)
    }

    /// Rejects a pending withdrawal and refunds it to the commission balance.
    pub async fn reject_withdrawal(&self, withdrawal_id: i64, reason: &str) -> Result<CommissionTransaction, EngineError> {
        let withdrawal = self.db.reject_withdrawal(withdrawal_id, reason).await?;
        self.notify_withdrawal(&withdrawal, NotificationType::WithdrawalRejected).await;
        Ok(withdrawal)
    }

    async fn notify_withdrawal(&self, withdrawal: &CommissionTransaction, notification_type: NotificationType) {
        let user_id = match self.db.fetch_affiliate(withdrawal.affiliate_id).await {
            Ok(Some(affiliate)) => affiliate.user_id,
            Ok(None) => return,
            Err(e) => {
                warn!("💸️ Could not look up affiliate #{} to send a notification. {e}", withdrawal.affiliate_id);
                return;
            },
        };
        let payload = json!({
            "withdrawal_id": withdrawal.id,
            "amount": -withdrawal.amount,
            "status": withdrawal.status,
        });
        self.producers.notify(NotificationEvent::new(user_id, notification_type, payload));
    }

    pub async fn history(&self, affiliate_id: i64) -> Result<Vec<CommissionTransaction>, EngineError> {
        self.db.fetch_commission_transactions(affiliate_id).await
    }

    pub async fn link_client(&self, link: NewAffiliateClientLink) -> Result<AffiliateClientLink, EngineError> {
        self.db.link_client(link).await
    }

    pub async fn active_link_for_client(&self, client_id: i64) -> Result<Option<AffiliateClientLink>, EngineError> {
        self.db.fetch_active_link_for_client(client_id, Utc::now()).await
    }

    pub async fn summary(&self, affiliate_id: i64) -> Result<AffiliateSummary, EngineError> {
        let profile = self
            .db
            .fetch_affiliate(affiliate_id)
            .await?
            .ok_or_else(|| EngineError::not_found(format!("Affiliate #{affiliate_id}")))?;
        let levels = self.db.fetch_affiliate_levels().await?;
        let pending_withdrawals = self
            .db
            .fetch_commission_transactions(affiliate_id)
            .await?
            .into_iter()
            .filter(|t| t.is_withdrawal() && t.status == CommissionStatus::Pending)
            .collect();
        Ok(AffiliateSummary {
            current_level: current_level(&levels, profile.total_referrals).cloned(),
            next_level: next_level(&levels, profile.total_referrals).cloned(),
            effective_rate: effective_rate(&levels, profile.total_referrals, self.rules.default_rate),
            profile,
            pending_withdrawals,
        })
    }
}
