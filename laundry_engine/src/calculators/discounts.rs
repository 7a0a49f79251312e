use chrono::{DateTime, Utc};
use laundry_common::Money;
use log::*;
use serde::{Deserialize, Serialize};

use crate::db_types::{Discount, Offer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountApplication {
    pub offer_id: i64,
    pub amount: Money,
    /// Loyalty points consumed by a points-exchange offer
    pub points_spent: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountOutcome {
    pub subtotal: Money,
    pub final_amount: Money,
    pub applied: Vec<DiscountApplication>,
}

impl DiscountOutcome {
    pub fn undiscounted(subtotal: Money) -> Self {
        Self { subtotal, final_amount: subtotal, applied: Vec::new() }
    }

    pub fn total_discount(&self) -> Money {
        self.applied.iter().map(|a| a.amount).sum()
    }

    pub fn points_redeemed(&self) -> i64 {
        self.applied.iter().map(|a| a.points_spent).sum()
    }
}

/// Works out which of the candidate `offers` apply to an order and what the customer pays.
///
/// Offers that are inactive at `now`, that exclude every ordered article, or whose minimum purchase exceeds the
/// subtotal are ignored. Non-cumulative offers are tried first (stable order otherwise), and the first one that
/// applies ends the evaluation. Points-exchange offers are skipped when `available_points` no longer covers them.
///
/// The final amount never drops below zero.
pub fn apply_discounts(
    subtotal: Money,
    article_ids: &[i64],
    offers: &[Offer],
    available_points: i64,
    now: DateTime<Utc>,
) -> DiscountOutcome {
    let mut candidates = offers
        .iter()
        .filter(|o| o.is_live_at(now) && o.applies_to(article_ids) && o.meets_minimum(subtotal))
        .collect::<Vec<&Offer>>();
    candidates.sort_by_key(|o| o.is_cumulative);
    let mut remaining = subtotal;
    let mut points = available_points;
    let mut applied = Vec::with_capacity(candidates.len());
    for offer in candidates {
        let (amount, points_spent) = match offer.discount {
            Discount::Percentage(rate) => (rate.of(subtotal), 0),
            Discount::FixedAmount(value) => (value, 0),
            Discount::PointsExchange { value, points_required } => {
                if points < points_required {
                    debug!(
                        "🧮️ Offer #{} needs {points_required} points but only {points} are available. Skipping it.",
                        offer.id
                    );
                    continue;
                }
                points -= points_required;
                (value, points_required)
            },
        };
        let amount = offer.max_discount_amount.map_or(amount, |max| amount.min(max)).max(Money::ZERO);
        remaining -= amount;
        trace!("🧮️ Offer #{} takes {amount} off", offer.id);
        applied.push(DiscountApplication { offer_id: offer.id, amount, points_spent });
        if !offer.is_cumulative {
            break;
        }
    }
    let final_amount = remaining.max(Money::ZERO);
    DiscountOutcome { subtotal, final_amount, applied }
}

#[cfg(test)]
mod test {
    use chrono::Duration;
    use laundry_common::Percent;

    use super::*;

    fn offer(id: i64, discount: Discount, is_cumulative: bool) -> Offer {
        let now = Utc::now();
        Offer {
            id,
            name: format!("offer {id}"),
            discount,
            min_purchase_amount: None,
            max_discount_amount: None,
            is_cumulative,
            is_active: true,
            start_date: now - Duration::days(1),
            end_date: now + Duration::days(1),
            eligible_articles: vec![],
        }
    }

    #[test]
    fn scenario_percentage_with_minimum() {
        let mut ten_percent = offer(1, Discount::Percentage(Percent::whole(10)), false);
        ten_percent.min_purchase_amount = Some(Money::from_units(1500));
        let outcome = apply_discounts(Money::from_units(2000), &[1], &[ten_percent.clone()], 0, Utc::now());
        assert_eq!(outcome.total_discount(), Money::from_units(200));
        assert_eq!(outcome.final_amount, Money::from_units(1800));

        let outcome = apply_discounts(Money::from_units(1000), &[1], &[ten_percent], 0, Utc::now());
        assert!(outcome.applied.is_empty());
        assert_eq!(outcome.final_amount, Money::from_units(1000));
    }

    #[test]
    fn non_cumulative_offer_is_exclusive() {
        // Supplied cumulative-first to show that ordering is by exclusivity, not input order
        let offers = vec![
            offer(2, Discount::FixedAmount(Money::from_units(500)), true),
            offer(1, Discount::Percentage(Percent::whole(20)), false),
        ];
        let outcome = apply_discounts(Money::from_units(3000), &[7], &offers, 0, Utc::now());
        assert_eq!(outcome.applied.len(), 1);
        assert_eq!(outcome.applied[0].offer_id, 1);
        assert_eq!(outcome.final_amount, Money::from_units(2400));
    }

    #[test]
    fn cumulative_offers_stack() {
        let offers = vec![
            offer(1, Discount::FixedAmount(Money::from_units(100)), true),
            offer(2, Discount::Percentage(Percent::whole(10)), true),
        ];
        let outcome = apply_discounts(Money::from_units(1000), &[7], &offers, 0, Utc::now());
        assert_eq!(outcome.applied.len(), 2);
        // Percentages are taken from the subtotal, not the running amount
        assert_eq!(outcome.final_amount, Money::from_units(800));
    }

    #[test]
    fn final_amount_never_negative() {
        let offers = vec![
            offer(1, Discount::FixedAmount(Money::from_units(700)), true),
            offer(2, Discount::FixedAmount(Money::from_units(600)), true),
        ];
        let outcome = apply_discounts(Money::from_units(1000), &[7], &offers, 0, Utc::now());
        assert_eq!(outcome.final_amount, Money::ZERO);
        assert_eq!(outcome.total_discount(), Money::from_units(1300));
    }

    #[test]
    fn discounts_are_clamped_to_their_maximum() {
        let mut capped = offer(1, Discount::Percentage(Percent::whole(50)), false);
        capped.max_discount_amount = Some(Money::from_units(100));
        let outcome = apply_discounts(Money::from_units(1000), &[7], &[capped], 0, Utc::now());
        assert_eq!(outcome.final_amount, Money::from_units(900));
    }

    #[test]
    fn a_discount_never_raises_the_price() {
        let mut capped = offer(1, Discount::FixedAmount(Money::from_units(10)), false);
        capped.max_discount_amount = Some(Money::from_units(-500));
        let outcome = apply_discounts(Money::from_units(20), &[7], &[capped], 0, Utc::now());
        assert_eq!(outcome.total_discount(), Money::ZERO);
        assert_eq!(outcome.final_amount, Money::from_units(20));
    }

    #[test]
    fn points_exchange_needs_enough_points() {
        let exchange = Discount::PointsExchange { value: Money::from_units(250), points_required: 100 };
        let offers = vec![offer(1, exchange, true), offer(2, exchange, true)];
        let outcome = apply_discounts(Money::from_units(1000), &[7], &offers, 150, Utc::now());
        assert_eq!(outcome.applied.len(), 1);
        assert_eq!(outcome.points_redeemed(), 100);
        assert_eq!(outcome.final_amount, Money::from_units(750));

        let outcome = apply_discounts(Money::from_units(1000), &[7], &offers, 50, Utc::now());
        assert!(outcome.applied.is_empty());
    }

    #[test]
    fn skipped_points_offer_does_not_end_evaluation() {
        let exchange = Discount::PointsExchange { value: Money::from_units(250), points_required: 100 };
        let offers = vec![offer(1, exchange, false), offer(2, Discount::FixedAmount(Money::from_units(50)), true)];
        let outcome = apply_discounts(Money::from_units(1000), &[7], &offers, 0, Utc::now());
        assert_eq!(outcome.applied.len(), 1);
        assert_eq!(outcome.applied[0].offer_id, 2);
    }

    #[test]
    fn article_restrictions_and_validity_windows() {
        let mut restricted = offer(1, Discount::FixedAmount(Money::from_units(50)), true);
        restricted.eligible_articles = vec![99];
        let mut expired = offer(2, Discount::FixedAmount(Money::from_units(50)), true);
        expired.end_date = Utc::now() - Duration::hours(1);
        let mut disabled = offer(3, Discount::FixedAmount(Money::from_units(50)), true);
        disabled.is_active = false;
        let offers = vec![restricted, expired, disabled];
        let outcome = apply_discounts(Money::from_units(1000), &[7, 8], &offers, 0, Utc::now());
        assert!(outcome.applied.is_empty());
        let outcome = apply_discounts(Money::from_units(1000), &[7, 99], &offers, 0, Utc::now());
        assert_eq!(outcome.applied.len(), 1);
    }
}
