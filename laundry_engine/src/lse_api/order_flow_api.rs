use std::fmt::Debug;

use laundry_common::Money;
use log::*;
use serde_json::json;

use crate::{
    config::SettlementRules,
    db::traits::{OrderManagement, SettlementDatabase},
    db_types::{Actor, NewOrder, Order, OrderPayment, OrderStatusType, PriceAdjustmentRecord},
    events::{EventProducers, NotificationEvent, NotificationType, OrderCreatedEvent, OrderModifiedEvent},
    lse_api::{
        errors::EngineError,
        order_objects::{OrderDetails, PriceAdjustment, SettledOrder},
    },
};

/// `OrderFlowApi` is the entry point for placing orders and for everything that happens to them afterwards: price
/// edits, status changes and payment.
///
/// Every storage call is a single atomic unit of work. Events are published only after it has committed, and a
/// failure to deliver one never affects the outcome of the call.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
    rules: SettlementRules,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi ({:?})", self.rules)
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers, rules: SettlementRules) -> Self {
        Self { db, producers, rules }
    }

    pub fn rules(&self) -> &SettlementRules {
        &self.rules
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}

impl<B> OrderFlowApi<B>
where B: SettlementDatabase + OrderManagement
{
    /// Settles a new order: prices every line, applies the requested offers, credits the affiliate chain and the
    /// customer's loyalty points, all or nothing.
    ///
    /// If no affiliate code is given, the customer's active affiliate link supplies one.
    pub async fn create_order(&self, order: NewOrder) -> Result<SettledOrder, EngineError> {
        let user_id = order.user_id;
        let settled = self.db.process_new_order(order, &self.rules).await?;
        debug!(
            "🔄️📦️ Order #{} for user #{user_id} settled. Final amount: {}, points earned: {}, commission paid: {}",
            settled.order.id,
            settled.pricing.final_amount,
            settled.rewards.points_earned,
            settled.total_commission()
        );
        self.producers.publish_order_created(OrderCreatedEvent::new(settled.order.clone(), settled.items.clone()));
        let payload = json!({
            "order_id": settled.order.id,
            "total_amount": settled.order.total_amount,
            "points_earned": settled.rewards.points_earned,
        });
        self.producers.notify(NotificationEvent::new(user_id, NotificationType::OrderCreated, payload));
        for credit in &settled.commissions {
            let payload = json!({
                "order_id": settled.order.id,
                "affiliate_id": credit.affiliate_id,
                "amount": credit.amount,
                "depth": credit.depth,
            });
            self.producers.notify(NotificationEvent::new(credit.user_id, NotificationType::CommissionEarned, payload));
        }
        Ok(settled)
    }

    /// Sets the manual price of an order, or clears it with `None` so that the computed total applies again.
    ///
    /// The customer's points and the affiliate's commission move by the change in effective price. Paid orders are
    /// refused with [`EngineError::OrderAlreadyPaid`].
    pub async fn adjust_order_price(
        &self,
        order_id: i64,
        new_manual_price: Option<Money>,
    ) -> Result<PriceAdjustment, EngineError> {
        let adjustment = self.db.reprice_order(order_id, new_manual_price, &self.rules).await?;
        if adjustment.is_noop() {
            trace!("🔄️💲️ Price edit on order #{order_id} did not change the effective price");
            return Ok(adjustment);
        }
        info!(
            "🔄️💲️ Order #{order_id} repriced from {} to {}",
            adjustment.old_price, adjustment.new_price
        );
        self.producers
            .publish_order_modified(OrderModifiedEvent::new(adjustment.old_order.clone(), adjustment.order.clone()));
        let payload = json!({
            "order_id": order_id,
            "old_price": adjustment.old_price,
            "new_price": adjustment.new_price,
            "points_adjustment": adjustment.points_adjustment,
        });
        self.producers.notify(NotificationEvent::new(
            adjustment.order.user_id,
            NotificationType::OrderPriceAdjusted,
            payload,
        ));
        Ok(adjustment)
    }

    /// Moves an order along its lifecycle. Only admins and delivery staff may do this, and only along the allowed
    /// edges: one step forward, or to `CANCELLED` from any status before `DELIVERED`.
    pub async fn update_order_status(
        &self,
        order_id: i64,
        new_status: OrderStatusType,
        actor: &Actor,
    ) -> Result<Order, EngineError> {
        if !actor.role.can_drive_order_status() {
            warn!(
                "🔄️🚚️ User #{} ({}) tried to move order #{order_id} to {new_status}",
                actor.user_id, actor.role
            );
            return Err(EngineError::InsufficientPermissions(actor.role.to_string()));
        }
        let (old_order, new_order) = self.db.update_order_status(order_id, new_status, actor.user_id).await?;
        debug!("🔄️🚚️ Order #{order_id} moved from {} to {}", old_order.status, new_order.status);
        self.producers.publish_order_modified(OrderModifiedEvent::new(old_order.clone(), new_order.clone()));
        let payload = json!({
            "order_id": order_id,
            "old_status": old_order.status,
            "new_status": new_order.status,
        });
        self.producers.notify(NotificationEvent::new(new_order.user_id, NotificationType::OrderStatusUpdated, payload));
        Ok(new_order)
    }

    pub async fn mark_order_paid(&self, order_id: i64) -> Result<OrderPayment, EngineError> {
        self.db.mark_order_paid(order_id).await
    }

    pub async fn fetch_order_details(&self, order_id: i64) -> Result<OrderDetails, EngineError> {
        self.db.fetch_order_details(order_id).await?.ok_or_else(|| EngineError::not_found(format!("Order #{order_id}")))
    }

    pub async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, EngineError> {
        self.db.fetch_orders_for_user(user_id).await
    }

    pub async fn price_adjustments(&self, order_id: i64) -> Result<Vec<PriceAdjustmentRecord>, EngineError> {
        self.db.fetch_price_adjustments(order_id).await
    }
}
