use laundry_common::Money;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Order, OrderDiscount, OrderItem, OrderPayment, OrderStatusChange},
    lse_api::affiliate_objects::CommissionCredit,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingBreakdown {
    pub subtotal: Money,
    pub total_discount: Money,
    pub final_amount: Money,
    /// Lines priced with the placeholder because their configuration was unusable
    pub degraded_lines: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RewardsSummary {
    pub points_earned: i64,
    pub points_redeemed: i64,
    /// The customer's balance after settlement
    pub points_balance: i64,
}

/// Everything settlement produced for one order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettledOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub discounts: Vec<OrderDiscount>,
    pub pricing: PricingBreakdown,
    pub rewards: RewardsSummary,
    pub commissions: Vec<CommissionCredit>,
}

impl SettledOrder {
    pub fn total_commission(&self) -> Money {
        self.commissions.iter().map(|c| c.amount).sum()
    }
}

/// The outcome of a manual price edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceAdjustment {
    pub old_order: Order,
    pub order: Order,
    pub old_price: Money,
    pub new_price: Money,
    /// Signed. Positive points were earned, negative points spent.
    pub points_adjustment: i64,
    /// Signed change applied to the affiliate's commission balance
    pub commission_delta: Money,
    pub affiliate_id: Option<i64>,
}

impl PriceAdjustment {
    pub fn price_difference(&self) -> Money {
        self.new_price - self.old_price
    }

    pub fn is_noop(&self) -> bool {
        self.price_difference().is_zero()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetails {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub discounts: Vec<OrderDiscount>,
    pub payment: Option<OrderPayment>,
    pub status_history: Vec<OrderStatusChange>,
}

impl OrderDetails {
    pub fn is_paid(&self) -> bool {
        self.payment.as_ref().map_or(false, |p| p.is_paid)
    }
}
