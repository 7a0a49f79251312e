use laundry_common::{Money, Percent};
use serde::{Deserialize, Serialize};

use crate::db_types::{AffiliateLevel, AffiliateProfile, CommissionTransaction};

/// One commission ledger row written during a credit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionCredit {
    pub affiliate_id: i64,
    /// The user behind the affiliate profile
    pub user_id: i64,
    pub affiliate_code: String,
    /// 0 for the referring affiliate, 1 for its parent, and so on
    pub depth: usize,
    pub amount: Money,
    pub transaction_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffiliateSummary {
    pub profile: AffiliateProfile,
    pub current_level: Option<AffiliateLevel>,
    pub next_level: Option<AffiliateLevel>,
    pub effective_rate: Percent,
    /// Pending withdrawals not yet reviewed
    pub pending_withdrawals: Vec<CommissionTransaction>,
}
