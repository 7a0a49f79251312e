use chrono::{DateTime, Utc};
use laundry_common::Money;
use laundry_engine::{
    affiliate_objects::CommissionCredit,
    config::{CommissionRules, SettlementRules},
    db_types::{
        AffiliateClientLink,
        AffiliateLevel,
        AffiliateProfile,
        AffiliateStatus,
        CommissionTransaction,
        LoyaltyAccount,
        NewAffiliate,
        NewAffiliateClientLink,
        NewAffiliateLevel,
        NewOrder,
        Order,
        OrderPayment,
        OrderStatusType,
        PointTransaction,
        PointsEntry,
        PriceAdjustmentRecord,
    },
    order_objects::{OrderDetails, PriceAdjustment, SettledOrder},
    AffiliateManagement,
    EngineError,
    LoyaltyManagement,
    OrderManagement,
    SettlementDatabase,
};
use mockall::mock;

mock! {
    pub OrderBackend {}
    impl Clone for OrderBackend {
        fn clone(&self) -> Self;
    }
    impl SettlementDatabase for OrderBackend {
        fn url(&self) -> &str;
        async fn process_new_order(&self, order: NewOrder, rules: &SettlementRules) -> Result<SettledOrder, EngineError>;
        async fn reprice_order(&self, order_id: i64, new_manual_price: Option<Money>, rules: &SettlementRules) -> Result<PriceAdjustment, EngineError>;
        async fn update_order_status(&self, order_id: i64, new_status: OrderStatusType, changed_by: i64) -> Result<(Order, Order), EngineError>;
        async fn mark_order_paid(&self, order_id: i64) -> Result<OrderPayment, EngineError>;
    }
    impl OrderManagement for OrderBackend {
        async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, EngineError>;
        async fn fetch_order_details(&self, order_id: i64) -> Result<Option<OrderDetails>, EngineError>;
        async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, EngineError>;
        async fn fetch_price_adjustments(&self, order_id: i64) -> Result<Vec<PriceAdjustmentRecord>, EngineError>;
    }
}

mock! {
    pub LoyaltyBackend {}
    impl LoyaltyManagement for LoyaltyBackend {
        async fn earn_points(&self, entry: PointsEntry) -> Result<LoyaltyAccount, EngineError>;
        async fn spend_points(&self, entry: PointsEntry) -> Result<LoyaltyAccount, EngineError>;
        async fn fetch_loyalty_account(&self, user_id: i64) -> Result<Option<LoyaltyAccount>, EngineError>;
        async fn fetch_point_transactions(&self, user_id: i64) -> Result<Vec<PointTransaction>, EngineError>;
    }
}

mock! {
    pub AffiliateBackend {}
    impl AffiliateManagement for AffiliateBackend {
        async fn insert_affiliate(&self, affiliate: NewAffiliate) -> Result<AffiliateProfile, EngineError>;
        async fn fetch_affiliate(&self, affiliate_id: i64) -> Result<Option<AffiliateProfile>, EngineError>;
        async fn fetch_affiliate_by_code(&self, code: &str) -> Result<Option<AffiliateProfile>, EngineError>;
        async fn update_affiliate_status(&self, affiliate_id: i64, status: AffiliateStatus) -> Result<AffiliateProfile, EngineError>;
        async fn assign_parent_affiliate(&self, affiliate_id: i64, parent_id: Option<i64>) -> Result<AffiliateProfile, EngineError>;
        async fn insert_affiliate_level(&self, level: NewAffiliateLevel) -> Result<AffiliateLevel, EngineError>;
        async fn fetch_affiliate_levels(&self) -> Result<Vec<AffiliateLevel>, EngineError>;
        async fn credit_commission(&self, order_id: i64, order_amount: Money, code: &str, rules: &CommissionRules) -> Result<Vec<CommissionCredit>, EngineError>;
        async fn request_withdrawal(&self, affiliate_id: i64, amount: Money) -> Result<CommissionTransaction, EngineError>;
        async fn approve_withdrawal(&self, withdrawal_id: i64) -> Result<CommissionTransaction, EngineError>;
        async fn reject_withdrawal(&self, withdrawal_id: i64, reason: &str) -> Result<CommissionTransaction, EngineError>;
        async fn fetch_commission_transactions(&self, affiliate_id: i64) -> Result<Vec<CommissionTransaction>, EngineError>;
        async fn link_client(&self, link: NewAffiliateClientLink) -> Result<AffiliateClientLink, EngineError>;
        async fn fetch_active_link_for_client(&self, client_id: i64, at: DateTime<Utc>) -> Result<Option<AffiliateClientLink>, EngineError>;
    }
}
