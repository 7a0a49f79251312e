use laundry_common::Money;
use log::*;
use sqlx::SqliteConnection;

use crate::{
    calculators::{discounts::DiscountApplication, pricing::LinePrice},
    db::sqlite::SqliteDatabaseError,
    db_types::{
        NewOrder,
        NewOrderItem,
        Order,
        OrderDiscount,
        OrderItem,
        OrderStatusChange,
        OrderStatusType,
        PriceAdjustmentRecord,
    },
    lse_api::errors::EngineError,
};

/// Inserts the order header with a zero subtotal. The totals are filled in by [`update_totals`] once the lines and
/// discounts are known. This is not atomic; call it inside a transaction.
pub async fn insert_order(
    order: &NewOrder,
    affiliate_code: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Order, SqliteDatabaseError> {
    let result = sqlx::query_as::<_, Order>(
        r#"
            INSERT INTO orders (
                user_id,
                address_id,
                service_type_id,
                status,
                subtotal,
                total_amount,
                payment_method,
                affiliate_code
            ) VALUES ($1, $2, $3, $4, 0, 0, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(order.user_id)
    .bind(order.address_id)
    .bind(order.service_type_id)
    .bind(OrderStatusType::Pending)
    .bind(&order.payment_method)
    .bind(affiliate_code)
    .fetch_one(conn)
    .await?;
    trace!("🗃️ Order #{} inserted for user #{}", result.id, result.user_id);
    Ok(result)
}

pub async fn insert_item(
    order_id: i64,
    item: &NewOrderItem,
    price: &LinePrice,
    conn: &mut SqliteConnection,
) -> Result<OrderItem, SqliteDatabaseError> {
    let result = sqlx::query_as::<_, OrderItem>(
        r#"
            INSERT INTO order_items (
                order_id,
                article_id,
                service_id,
                quantity,
                weight,
                unit_price,
                line_total,
                pricing_type,
                is_premium
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(item.article_id)
    .bind(item.service_id)
    .bind(item.quantity)
    .bind(item.weight)
    .bind(price.unit_price)
    .bind(price.line_total)
    .bind(price.pricing_type.to_string())
    .bind(item.is_premium)
    .fetch_one(conn)
    .await?;
    Ok(result)
}

pub async fn insert_discount(
    order_id: i64,
    discount: &DiscountApplication,
    conn: &mut SqliteConnection,
) -> Result<OrderDiscount, SqliteDatabaseError> {
    let result = sqlx::query_as::<_, OrderDiscount>(
        r#"
            INSERT INTO order_discounts (order_id, offer_id, amount, points_spent)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(discount.offer_id)
    .bind(discount.amount)
    .bind(discount.points_spent)
    .fetch_one(conn)
    .await?;
    Ok(result)
}

pub async fn update_totals(
    order_id: i64,
    subtotal: Money,
    total_amount: Money,
    conn: &mut SqliteConnection,
) -> Result<Order, SqliteDatabaseError> {
    let result = sqlx::query_as::<_, Order>(
        r#"
            UPDATE orders SET subtotal = $1, total_amount = $2, updated_at = CURRENT_TIMESTAMP
            WHERE id = $3
            RETURNING *;
        "#,
    )
    .bind(subtotal)
    .bind(total_amount)
    .bind(order_id)
    .fetch_one(conn)
    .await?;
    Ok(result)
}

pub async fn fetch_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, SqliteDatabaseError> {
    let order =
        sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

/// Like [`fetch_order`], but a missing order is an error.
pub async fn fetch_existing_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Order, SqliteDatabaseError> {
    fetch_order(order_id, conn).await?.ok_or_else(|| EngineError::not_found(format!("Order #{order_id}")).into())
}

pub async fn fetch_orders_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, SqliteDatabaseError> {
    let orders = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE user_id = $1 ORDER BY id")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

pub async fn fetch_items(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, SqliteDatabaseError> {
    let items = sqlx::query_as::<_, OrderItem>("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

pub async fn fetch_discounts(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderDiscount>, SqliteDatabaseError> {
    let discounts = sqlx::query_as::<_, OrderDiscount>("SELECT * FROM order_discounts WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(discounts)
}

/// Moves the order from `old_status` to `new_status` and appends a history row.
///
/// The update only matches while the order still has `old_status`, so a concurrent change makes this fail with
/// [`EngineError::InvalidTransition`] instead of silently overwriting it.
pub async fn update_status(
    order_id: i64,
    old_status: OrderStatusType,
    new_status: OrderStatusType,
    changed_by: i64,
    conn: &mut SqliteConnection,
) -> Result<Order, SqliteDatabaseError> {
    let updated = sqlx::query_as::<_, Order>(
        r#"
            UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND status = $3
            RETURNING *;
        "#,
    )
    .bind(new_status)
    .bind(order_id)
    .bind(old_status)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| EngineError::InvalidTransition { from: old_status.to_string(), to: new_status.to_string() })?;
    sqlx::query(
        r#"
            INSERT INTO order_status_history (order_id, old_status, new_status, changed_by)
            VALUES ($1, $2, $3, $4);
        "#,
    )
    .bind(order_id)
    .bind(old_status)
    .bind(new_status)
    .bind(changed_by)
    .execute(&mut *conn)
    .await?;
    debug!("🗃️ Order #{order_id} moved from {old_status} to {new_status} by user #{changed_by}");
    Ok(updated)
}

pub async fn fetch_status_history(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderStatusChange>, SqliteDatabaseError> {
    let history =
        sqlx::query_as::<_, OrderStatusChange>("SELECT * FROM order_status_history WHERE order_id = $1 ORDER BY id")
            .bind(order_id)
            .fetch_all(conn)
            .await?;
    Ok(history)
}

pub async fn set_manual_price(
    order_id: i64,
    manual_price: Option<Money>,
    conn: &mut SqliteConnection,
) -> Result<Order, SqliteDatabaseError> {
    let result = sqlx::query_as::<_, Order>(
        r#"
            UPDATE orders SET manual_price = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2
            RETURNING *;
        "#,
    )
    .bind(manual_price)
    .bind(order_id)
    .fetch_one(conn)
    .await?;
    Ok(result)
}

pub async fn insert_price_adjustment(
    order_id: i64,
    old_price: Money,
    new_price: Money,
    points_adjustment: i64,
    commission_delta: Money,
    conn: &mut SqliteConnection,
) -> Result<PriceAdjustmentRecord, SqliteDatabaseError> {
    let result = sqlx::query_as::<_, PriceAdjustmentRecord>(
        r#"
            INSERT INTO order_price_adjustments (order_id, old_price, new_price, points_adjustment, commission_delta)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(old_price)
    .bind(new_price)
    .bind(points_adjustment)
    .bind(commission_delta)
    .fetch_one(conn)
    .await?;
    Ok(result)
}

pub async fn fetch_price_adjustments(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<PriceAdjustmentRecord>, SqliteDatabaseError> {
    let records = sqlx::query_as::<_, PriceAdjustmentRecord>(
        "SELECT * FROM order_price_adjustments WHERE order_id = $1 ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(records)
}
