use laundry_common::{Money, Percent};

use crate::db_types::AffiliateLevel;

/// The fallback rate when no affiliate level matches.
pub const DEFAULT_COMMISSION_RATE: Percent = Percent::whole(10);
/// Each ancestor receives this share of the commission credited one level below it.
pub const DEFAULT_PARENT_COMMISSION_RATE: Percent = Percent::whole(10);
pub const DEFAULT_MAX_PARENT_LEVELS: usize = 3;

/// The level with the highest `min_referrals` that the affiliate has reached.
pub fn current_level(levels: &[AffiliateLevel], total_referrals: i64) -> Option<&AffiliateLevel> {
    levels.iter().filter(|l| l.min_referrals <= total_referrals).max_by_key(|l| l.min_referrals)
}

/// The lowest level the affiliate has not reached yet.
pub fn next_level(levels: &[AffiliateLevel], total_referrals: i64) -> Option<&AffiliateLevel> {
    levels.iter().filter(|l| l.min_referrals > total_referrals).min_by_key(|l| l.min_referrals)
}

pub fn effective_rate(levels: &[AffiliateLevel], total_referrals: i64, default_rate: Percent) -> Percent {
    current_level(levels, total_referrals).map_or(default_rate, |l| l.commission_rate)
}

pub fn commission_for(order_amount: Money, rate: Percent) -> Money {
    rate.of(order_amount)
}

/// True when making `proposed_parent` the parent of `affiliate_id` would close a loop.
///
/// `parent_chain` lists the proposed parent's ancestors, nearest first (not including `proposed_parent` itself).
pub fn creates_cycle(affiliate_id: i64, proposed_parent: i64, parent_chain: &[i64]) -> bool {
    proposed_parent == affiliate_id || parent_chain.contains(&affiliate_id)
}
