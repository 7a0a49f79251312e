use std::fmt::Debug;

use log::*;
use serde_json::json;

use crate::{
    calculators::loyalty::LoyaltyTier,
    db::traits::LoyaltyManagement,
    db_types::{LoyaltyAccount, PointSource, PointTransaction, PointsEntry},
    events::{EventProducers, NotificationEvent, NotificationType},
    lse_api::{errors::EngineError, loyalty_objects::LoyaltySummary},
};

/// Direct access to the loyalty ledger, for admin tools and for the parts of the platform that award or redeem points
/// outside order settlement.
pub struct LoyaltyApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for LoyaltyApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LoyaltyApi")
    }
}

impl<B> LoyaltyApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> LoyaltyApi<B>
where B: LoyaltyManagement
{
    pub async fn earn_points(
        &self,
        user_id: i64,
        points: i64,
        source: PointSource,
        reference_id: &str,
    ) -> Result<LoyaltyAccount, EngineError> {
        check_positive(points)?;
        let account = self.db.earn_points(PointsEntry::new(user_id, points, source, reference_id)).await?;
        let payload = json!({ "points": points, "source": source, "balance": account.points_balance });
        self.producers.notify(NotificationEvent::new(user_id, NotificationType::PointsEarned, payload));
        Ok(account)
    }

    /// Fails with [`EngineError::InsufficientPoints`] if the balance does not cover `points`.
    pub async fn spend_points(
        &self,
        user_id: i64,
        points: i64,
        source: PointSource,
        reference_id: &str,
    ) -> Result<LoyaltyAccount, EngineError> {
        check_positive(points)?;
        self.db.spend_points(PointsEntry::new(user_id, points, source, reference_id)).await
    }

    /// An order-driven debit. Behaves exactly like [`Self::spend_points`] with an `ORDER` source.
    pub async fn deduct_points(&self, user_id: i64, points: i64, reference_id: &str) -> Result<LoyaltyAccount, EngineError> {
        trace!("🎁️ Deducting {points} points from user #{user_id} for {reference_id}");
        self.spend_points(user_id, points, PointSource::Order, reference_id).await
    }

    /// The current balance. A user who has never earned points has a balance of zero.
    pub async fn balance(&self, user_id: i64) -> Result<i64, EngineError> {
        let account = self.db.fetch_loyalty_account(user_id).await?;
        Ok(account.map_or(0, |a| a.points_balance))
    }

    pub async fn history(&self, user_id: i64) -> Result<Vec<PointTransaction>, EngineError> {
        self.db.fetch_point_transactions(user_id).await
    }

    pub async fn summary(&self, user_id: i64) -> Result<LoyaltySummary, EngineError> {
        let (points_balance, total_earned) =
            self.db.fetch_loyalty_account(user_id).await?.map_or((0, 0), |a| (a.points_balance, a.total_earned));
        Ok(LoyaltySummary {
            user_id,
            points_balance,
            total_earned,
            tier: LoyaltyTier::for_total_earned(total_earned),
            points_to_next_tier: LoyaltyTier::points_to_next(total_earned),
        })
    }
}

fn check_positive(points: i64) -> Result<(), EngineError> {
    if points <= 0 {
        return Err(EngineError::invalid(format!("Points must be positive, got {points}")));
    }
    Ok(())
}
