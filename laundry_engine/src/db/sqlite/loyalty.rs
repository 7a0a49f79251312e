use log::*;
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{LoyaltyAccount, PointTransaction, PointTransactionType, PointsEntry},
    lse_api::errors::EngineError,
};

pub async fn fetch_account(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<LoyaltyAccount>, SqliteDatabaseError> {
    let result = sqlx::query_as::<_, LoyaltyAccount>("SELECT * FROM loyalty_points WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(result)
}

/// The current balance, or zero when the user has never earned anything.
pub async fn balance(user_id: i64, conn: &mut SqliteConnection) -> Result<i64, SqliteDatabaseError> {
    Ok(fetch_account(user_id, conn).await?.map_or(0, |a| a.points_balance))
}

/// Appends an `EARNED` ledger row and adds the points to the balance and lifetime total, creating the account if
/// needed. This is not atomic; call it inside a transaction.
pub async fn earn(entry: &PointsEntry, conn: &mut SqliteConnection) -> Result<LoyaltyAccount, SqliteDatabaseError> {
    if entry.points <= 0 {
        return Err(EngineError::invalid(format!("Cannot earn {} points", entry.points)).into());
    }
    insert_transaction(entry, entry.points, PointTransactionType::Earned, conn).await?;
    let account = sqlx::query_as::<_, LoyaltyAccount>(
        r#"
            INSERT INTO loyalty_points (user_id, points_balance, total_earned) VALUES ($1, $2, $2)
            ON CONFLICT (user_id) DO UPDATE SET
                points_balance = points_balance + excluded.points_balance,
                total_earned = total_earned + excluded.total_earned,
                updated_at = CURRENT_TIMESTAMP
            RETURNING *;
        "#,
    )
    .bind(entry.user_id)
    .bind(entry.points)
    .fetch_one(conn)
    .await?;
    debug!(
        "🎁️ User #{} earned {} points ({} {}). Balance: {}",
        entry.user_id, entry.points, entry.source, entry.reference_id, account.points_balance
    );
    Ok(account)
}

/// Appends a `SPENT` ledger row and takes the points off the balance.
///
/// The balance is only decremented while it covers the amount, so two concurrent spends cannot both succeed against
/// the same points. The balance is re-read afterwards and a negative value aborts the transaction.
pub async fn spend(entry: &PointsEntry, conn: &mut SqliteConnection) -> Result<LoyaltyAccount, SqliteDatabaseError> {
    if entry.points <= 0 {
        return Err(EngineError::invalid(format!("Cannot spend {} points", entry.points)).into());
    }
    let updated = sqlx::query(
        r#"
            UPDATE loyalty_points SET points_balance = points_balance - $1, updated_at = CURRENT_TIMESTAMP
            WHERE user_id = $2 AND points_balance >= $1;
        "#,
    )
    .bind(entry.points)
    .bind(entry.user_id)
    .execute(&mut *conn)
    .await?;
    if updated.rows_affected() == 0 {
        let available = balance(entry.user_id, conn).await?;
        debug!("🎁️ User #{} tried to spend {} points but only has {available}", entry.user_id, entry.points);
        return Err(EngineError::InsufficientPoints { available, requested: entry.points }.into());
    }
    insert_transaction(entry, -entry.points, PointTransactionType::Spent, conn).await?;
    let account = fetch_account(entry.user_id, conn)
        .await?
        .ok_or_else(|| EngineError::not_found(format!("Loyalty account for user #{}", entry.user_id)))?;
    if account.points_balance < 0 {
        error!(
            "🎁️ The points balance for user #{} went negative ({}). Rolling back.",
            entry.user_id, account.points_balance
        );
        return Err(EngineError::NegativeBalanceInvariantViolation {
            user_id: entry.user_id,
            balance: account.points_balance,
        }
        .into());
    }
    debug!(
        "🎁️ User #{} spent {} points ({} {}). Balance: {}",
        entry.user_id, entry.points, entry.source, entry.reference_id, account.points_balance
    );
    Ok(account)
}

async fn insert_transaction(
    entry: &PointsEntry,
    signed_points: i64,
    transaction_type: PointTransactionType,
    conn: &mut SqliteConnection,
) -> Result<PointTransaction, SqliteDatabaseError> {
    let result = sqlx::query_as::<_, PointTransaction>(
        r#"
            INSERT INTO point_transactions (user_id, points, transaction_type, source, reference_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(entry.user_id)
    .bind(signed_points)
    .bind(transaction_type)
    .bind(entry.source)
    .bind(&entry.reference_id)
    .fetch_one(conn)
    .await?;
    Ok(result)
}

pub async fn fetch_transactions(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<PointTransaction>, SqliteDatabaseError> {
    let result = sqlx::query_as::<_, PointTransaction>("SELECT * FROM point_transactions WHERE user_id = $1 ORDER BY id")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(result)
}
