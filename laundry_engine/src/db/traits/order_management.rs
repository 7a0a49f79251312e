use crate::{
    db_types::{Order, PriceAdjustmentRecord},
    lse_api::{errors::EngineError, order_objects::OrderDetails},
};

/// Read paths over orders.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, EngineError>;

    /// The order with its items, applied discounts, payment record and status history.
    async fn fetch_order_details(&self, order_id: i64) -> Result<Option<OrderDetails>, EngineError>;

    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, EngineError>;

    async fn fetch_price_adjustments(&self, order_id: i64) -> Result<Vec<PriceAdjustmentRecord>, EngineError>;
}
