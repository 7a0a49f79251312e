use std::fmt::Display;

use laundry_common::Money;
use serde::{Deserialize, Serialize};

/// Points credited for `amount` at `multiplier` points per currency unit, rounded towards negative infinity.
pub fn points_for(amount: Money, multiplier: f64) -> i64 {
    (amount.as_units() * multiplier).floor() as i64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoyaltyTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl LoyaltyTier {
    /// Tiers are based on lifetime points, so spending never demotes a customer.
    pub fn for_total_earned(total_earned: i64) -> Self {
        match total_earned {
            t if t >= 10_001 => LoyaltyTier::Platinum,
            t if t >= 5_001 => LoyaltyTier::Gold,
            t if t >= 1_001 => LoyaltyTier::Silver,
            _ => LoyaltyTier::Bronze,
        }
    }

    pub fn threshold(&self) -> i64 {
        match self {
            LoyaltyTier::Bronze => 0,
            LoyaltyTier::Silver => 1_001,
            LoyaltyTier::Gold => 5_001,
            LoyaltyTier::Platinum => 10_001,
        }
    }

    pub fn next(&self) -> Option<Self> {
        match self {
            LoyaltyTier::Bronze => Some(LoyaltyTier::Silver),
            LoyaltyTier::Silver => Some(LoyaltyTier::Gold),
            LoyaltyTier::Gold => Some(LoyaltyTier::Platinum),
            LoyaltyTier::Platinum => None,
        }
    }

    /// Lifetime points still needed to reach the next tier, if there is one.
    pub fn points_to_next(total_earned: i64) -> Option<i64> {
        Self::for_total_earned(total_earned).next().map(|t| t.threshold() - total_earned)
    }
}

impl Display for LoyaltyTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LoyaltyTier::Bronze => "BRONZE",
            LoyaltyTier::Silver => "SILVER",
            LoyaltyTier::Gold => "GOLD",
            LoyaltyTier::Platinum => "PLATINUM",
        };
        f.write_str(s)
    }
}
