use crate::{
    db_types::{LoyaltyAccount, PointTransaction, PointsEntry},
    lse_api::errors::EngineError,
};

/// The loyalty ledger. Every mutation appends to the ledger and updates the materialised balance atomically, and
/// the balance never goes below zero.
#[allow(async_fn_in_trait)]
pub trait LoyaltyManagement {
    /// Credits `entry.points`, creating the account on first use.
    async fn earn_points(&self, entry: PointsEntry) -> Result<LoyaltyAccount, EngineError>;

    /// Debits `entry.points`, failing with [`EngineError::InsufficientPoints`] if the balance does not cover it.
    async fn spend_points(&self, entry: PointsEntry) -> Result<LoyaltyAccount, EngineError>;

    async fn fetch_loyalty_account(&self, user_id: i64) -> Result<Option<LoyaltyAccount>, EngineError>;

    /// The user's ledger, oldest first.
    async fn fetch_point_transactions(&self, user_id: i64) -> Result<Vec<PointTransaction>, EngineError>;
}
