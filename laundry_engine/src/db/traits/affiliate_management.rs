use chrono::{DateTime, Utc};
use laundry_common::Money;

use crate::{
    config::CommissionRules,
    db_types::{
        AffiliateClientLink,
        AffiliateLevel,
        AffiliateProfile,
        AffiliateStatus,
        CommissionTransaction,
        NewAffiliate,
        NewAffiliateClientLink,
        NewAffiliateLevel,
    },
    lse_api::{affiliate_objects::CommissionCredit, errors::EngineError},
};

#[allow(async_fn_in_trait)]
pub trait AffiliateManagement {
    /// Registers a new, pending affiliate with a freshly generated code. An unknown parent code is refused.
    async fn insert_affiliate(&self, affiliate: NewAffiliate) -> Result<AffiliateProfile, EngineError>;

    async fn fetch_affiliate(&self, affiliate_id: i64) -> Result<Option<AffiliateProfile>, EngineError>;

    async fn fetch_affiliate_by_code(&self, code: &str) -> Result<Option<AffiliateProfile>, EngineError>;

    /// Sets the review status. `ACTIVE` also sets `is_active`; any other status clears it.
    async fn update_affiliate_status(
        &self,
        affiliate_id: i64,
        status: AffiliateStatus,
    ) -> Result<AffiliateProfile, EngineError>;

    /// Re-parents an affiliate. Assignments that would make the affiliate its own ancestor are refused.
    async fn assign_parent_affiliate(
        &self,
        affiliate_id: i64,
        parent_id: Option<i64>,
    ) -> Result<AffiliateProfile, EngineError>;

    async fn insert_affiliate_level(&self, level: NewAffiliateLevel) -> Result<AffiliateLevel, EngineError>;

    async fn fetch_affiliate_levels(&self) -> Result<Vec<AffiliateLevel>, EngineError>;

    /// Credits commission on `order_amount` to the affiliate owning `code` and a decaying share to its ancestors.
    /// Returns one credit per ledger row written, the direct affiliate first.
    async fn credit_commission(
        &self,
        order_id: i64,
        order_amount: Money,
        code: &str,
        rules: &CommissionRules,
    ) -> Result<Vec<CommissionCredit>, EngineError>;

    /// Moves `amount` out of the commission balance into a pending withdrawal.
    async fn request_withdrawal(&self, affiliate_id: i64, amount: Money) -> Result<CommissionTransaction, EngineError>;

    async fn approve_withdrawal(&self, withdrawal_id: i64) -> Result<CommissionTransaction, EngineError>;

    /// Rejects a pending withdrawal and returns its amount to the commission balance.
    async fn reject_withdrawal(&self, withdrawal_id: i64, reason: &str) -> Result<CommissionTransaction, EngineError>;

    async fn fetch_commission_transactions(&self, affiliate_id: i64) -> Result<Vec<CommissionTransaction>, EngineError>;

    async fn link_client(&self, link: NewAffiliateClientLink) -> Result<AffiliateClientLink, EngineError>;

    /// The most recently started link for the client that is in force at `at` and belongs to an active affiliate.
    async fn fetch_active_link_for_client(
        &self,
        client_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<AffiliateClientLink>, EngineError>;
}
