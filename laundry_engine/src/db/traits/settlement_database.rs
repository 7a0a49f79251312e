use laundry_common::Money;

use crate::{
    config::SettlementRules,
    db_types::{NewOrder, Order, OrderPayment, OrderStatusType},
    lse_api::{
        errors::EngineError,
        order_objects::{PriceAdjustment, SettledOrder},
    },
};

/// The atomic units of work behind order settlement.
#[allow(async_fn_in_trait)]
pub trait SettlementDatabase: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Settles a brand-new order in one transaction:
    /// * resolves the affiliate code, falling back to the customer's active affiliate link,
    /// * checks that every article exists and has not been deleted,
    /// * prices every line and stores the order, its items and an unpaid payment record,
    /// * applies the requested offers and stores the discounted total (redeeming points where an offer needs them),
    /// * credits the affiliate chain and links the customer to the affiliate,
    /// * credits the customer's loyalty points.
    ///
    /// If any step fails, nothing is stored.
    async fn process_new_order(&self, order: NewOrder, rules: &SettlementRules) -> Result<SettledOrder, EngineError>;

    /// Sets (or clears, with `None`) the manual price of an order and moves the customer's points and the affiliate's
    /// commission by the change in effective price. Orders that have been paid are refused with
    /// [`EngineError::OrderAlreadyPaid`].
    async fn reprice_order(
        &self,
        order_id: i64,
        new_manual_price: Option<Money>,
        rules: &SettlementRules,
    ) -> Result<PriceAdjustment, EngineError>;

    /// Moves an order to `new_status` if the transition is allowed from its current status, and records who did it.
    /// Returns the order before and after the change.
    async fn update_order_status(
        &self,
        order_id: i64,
        new_status: OrderStatusType,
        changed_by: i64,
    ) -> Result<(Order, Order), EngineError>;

    async fn mark_order_paid(&self, order_id: i64) -> Result<OrderPayment, EngineError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), EngineError> {
        Ok(())
    }
}
