use log::*;
use sqlx::SqliteConnection;

use crate::{db::sqlite::SqliteDatabaseError, db_types::OrderPayment, lse_api::errors::EngineError};

/// Every order gets an unpaid payment record when it is settled.
pub async fn insert_unpaid(order_id: i64, conn: &mut SqliteConnection) -> Result<OrderPayment, SqliteDatabaseError> {
    let result = sqlx::query_as::<_, OrderPayment>(
        "INSERT INTO order_payments (order_id, is_paid) VALUES ($1, 0) RETURNING *;",
    )
    .bind(order_id)
    .fetch_one(conn)
    .await?;
    Ok(result)
}

pub async fn fetch_payment(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<OrderPayment>, SqliteDatabaseError> {
    let result = sqlx::query_as::<_, OrderPayment>("SELECT * FROM order_payments WHERE order_id = $1")
        .bind(order_id)
        .fetch_optional(conn)
        .await?;
    Ok(result)
}

pub async fn is_paid(order_id: i64, conn: &mut SqliteConnection) -> Result<bool, SqliteDatabaseError> {
    Ok(fetch_payment(order_id, conn).await?.map_or(false, |p| p.is_paid))
}

/// Marks the order as paid. Paying an order twice is refused with [`EngineError::OrderAlreadyPaid`].
pub async fn mark_paid(order_id: i64, conn: &mut SqliteConnection) -> Result<OrderPayment, SqliteDatabaseError> {
    let result = sqlx::query_as::<_, OrderPayment>(
        r#"
            INSERT INTO order_payments (order_id, is_paid, paid_at) VALUES ($1, 1, CURRENT_TIMESTAMP)
            ON CONFLICT (order_id) DO UPDATE SET
                is_paid = 1,
                paid_at = CURRENT_TIMESTAMP,
                updated_at = CURRENT_TIMESTAMP
            WHERE order_payments.is_paid = 0
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .fetch_optional(conn)
    .await?
    .ok_or(EngineError::OrderAlreadyPaid(order_id))?;
    info!("🗃️ Order #{order_id} has been paid");
    Ok(result)
}
