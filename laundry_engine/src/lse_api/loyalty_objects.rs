use serde::{Deserialize, Serialize};

use crate::calculators::loyalty::LoyaltyTier;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltySummary {
    pub user_id: i64,
    pub points_balance: i64,
    pub total_earned: i64,
    pub tier: LoyaltyTier,
    pub points_to_next_tier: Option<i64>,
}
