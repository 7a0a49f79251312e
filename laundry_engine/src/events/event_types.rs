use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db_types::{Order, OrderItem};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl OrderCreatedEvent {
    pub fn new(order: Order, items: Vec<OrderItem>) -> Self {
        Self { order, items }
    }
}

/// Emitted after a status transition or a price adjustment commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderModifiedEvent {
    pub old_order: Order,
    pub new_order: Order,
}

impl OrderModifiedEvent {
    pub fn new(old_order: Order, new_order: Order) -> Self {
        Self { old_order, new_order }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    OrderCreated,
    OrderStatusUpdated,
    OrderPriceAdjusted,
    CommissionEarned,
    PointsEarned,
    WithdrawalRequested,
    WithdrawalApproved,
    WithdrawalRejected,
}

impl Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NotificationType::OrderCreated => "ORDER_CREATED",
            NotificationType::OrderStatusUpdated => "ORDER_STATUS_UPDATED",
            NotificationType::OrderPriceAdjusted => "ORDER_PRICE_ADJUSTED",
            NotificationType::CommissionEarned => "COMMISSION_EARNED",
            NotificationType::PointsEarned => "POINTS_EARNED",
            NotificationType::WithdrawalRequested => "WITHDRAWAL_REQUESTED",
            NotificationType::WithdrawalApproved => "WITHDRAWAL_APPROVED",
            NotificationType::WithdrawalRejected => "WITHDRAWAL_REJECTED",
        };
        f.write_str(s)
    }
}

/// A request for the notification collaborator to tell `user_id` about something. Delivery is best-effort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub user_id: i64,
    pub notification_type: NotificationType,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

impl NotificationEvent {
    pub fn new(user_id: i64, notification_type: NotificationType, payload: Value) -> Self {
        Self { user_id, notification_type, payload, created_at: Utc::now() }
    }
}
