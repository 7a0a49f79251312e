//! The composite units of work behind order settlement.
//!
//! None of these functions open or commit a transaction. [`SqliteDatabase`](super::SqliteDatabase) wraps each one in
//! its own transaction, so that a failure at any step leaves the store untouched.
use chrono::Utc;
use laundry_common::Money;
use log::*;
use sqlx::SqliteConnection;

use crate::{
    calculators::{
        commission::{commission_for, effective_rate},
        discounts::{apply_discounts, DiscountOutcome},
        loyalty::points_for,
        pricing::{price_line, LinePrice},
    },
    config::SettlementRules,
    db::sqlite::{affiliates, catalog, loyalty, offers, orders, payments, SqliteDatabaseError},
    db_types::{
        ArticleServicePrice,
        NewAffiliateClientLink,
        NewOrder,
        Order,
        OrderStatusType,
        PointSource,
        PointsEntry,
        PriceKey,
    },
    lse_api::{
        errors::EngineError,
        order_objects::{PriceAdjustment, PricingBreakdown, RewardsSummary, SettledOrder},
    },
    price_cache::PriceCache,
};

/// Looks the price row up in the cache, then the store, auto-provisioning a placeholder row if there is none.
///
/// `generation` is the cache generation taken before the transaction behind `conn` was opened. Only rows that already
/// existed are cached. A freshly provisioned row belongs to the open transaction and would outlive a rollback.
pub async fn resolve_price(
    key: &PriceKey,
    cache: &PriceCache,
    generation: u64,
    conn: &mut SqliteConnection,
) -> Result<ArticleServicePrice, SqliteDatabaseError> {
    if let Some(price) = cache.get(key) {
        return Ok(price);
    }
    let (price, created) = catalog::fetch_or_create_price(key, conn).await?;
    if !created {
        cache.insert(price.clone(), generation);
    }
    Ok(price)
}

/// Resolves the affiliate code for a new order: the one supplied, or else the one from the customer's active link.
/// A supplied code must belong to an eligible affiliate.
async fn resolve_affiliate_code(order: &NewOrder, conn: &mut SqliteConnection) -> Result<Option<String>, SqliteDatabaseError> {
    if let Some(code) = &order.affiliate_code {
        let affiliate = affiliates::fetch_affiliate_by_code(code, conn)
            .await?
            .ok_or_else(|| EngineError::not_found(format!("Affiliate with code {code}")))?;
        if !affiliate.is_eligible() {
            return Err(EngineError::InactiveResource(format!("Affiliate {code}")).into());
        }
        return Ok(Some(affiliate.affiliate_code));
    }
    let Some(link) = affiliates::fetch_active_link_for_client(order.user_id, Utc::now(), conn).await? else {
        return Ok(None);
    };
    let affiliate = affiliates::fetch_existing_affiliate(link.affiliate_id, conn).await?;
    debug!("🔄️ User #{} is linked to affiliate {}. Using that code.", order.user_id, affiliate.affiliate_code);
    Ok(Some(affiliate.affiliate_code))
}

/// Settles a new order. `cache_generation` is the price cache generation taken before the transaction was opened.
pub async fn settle_order(
    order: NewOrder,
    rules: &SettlementRules,
    cache: &PriceCache,
    cache_generation: u64,
    conn: &mut SqliteConnection,
) -> Result<SettledOrder, SqliteDatabaseError> {
    order.validate().map_err(EngineError::ValidationError)?;
    let affiliate_code = resolve_affiliate_code(&order, conn).await?;
    let article_ids = order.article_ids();
    for article_id in &article_ids {
        catalog::fetch_live_article(*article_id, conn).await?;
    }
    catalog::fetch_service_type(order.service_type_id, conn)
        .await?
        .ok_or_else(|| EngineError::not_found(format!("Service type #{}", order.service_type_id)))?;
    let requested_offers = offers::fetch_offers(&order.offer_ids, conn).await?;
    if let Some(missing) = order.offer_ids.iter().find(|id| !requested_offers.iter().any(|o| o.id == **id)) {
        return Err(EngineError::not_found(format!("Offer #{missing}")).into());
    }

    let mut lines: Vec<LinePrice> = Vec::with_capacity(order.items.len());
    for item in &order.items {
        let key = PriceKey::new(item.article_id, order.service_type_id, item.service_id);
        let price = resolve_price(&key, cache, cache_generation, conn).await?;
        lines.push(price_line(&price, item.quantity, item.weight, item.is_premium)?);
    }
    let subtotal = Money::checked_sum(lines.iter().map(|l| l.line_total))
        .ok_or_else(|| EngineError::invalid("The order subtotal is too large"))?;
    let degraded_lines = lines.iter().filter(|l| l.degraded).count();

    let header = orders::insert_order(&order, affiliate_code.as_deref(), conn).await?;
    let order_id = header.id;
    let mut items = Vec::with_capacity(order.items.len());
    for (item, line) in order.items.iter().zip(lines.iter()) {
        items.push(orders::insert_item(order_id, item, line, conn).await?);
    }
    payments::insert_unpaid(order_id, conn).await?;
    trace!("🔄️ Order #{order_id} stored with {} items and a subtotal of {subtotal}", items.len());

    let outcome = if requested_offers.is_empty() {
        DiscountOutcome::undiscounted(subtotal)
    } else {
        let available_points = loyalty::balance(order.user_id, conn).await?;
        apply_discounts(subtotal, &article_ids, &requested_offers, available_points, Utc::now())
    };
    let mut discounts = Vec::with_capacity(outcome.applied.len());
    for applied in &outcome.applied {
        if applied.points_spent > 0 {
            let entry =
                PointsEntry::new(order.user_id, applied.points_spent, PointSource::OfferRedemption, order_id.to_string());
            loyalty::spend(&entry, conn).await?;
        }
        discounts.push(orders::insert_discount(order_id, applied, conn).await?);
    }
    let final_amount = outcome.final_amount;
    let settled_order = orders::update_totals(order_id, subtotal, final_amount, conn).await?;
    debug!("🔄️ Order #{order_id}: subtotal {subtotal}, {} discounts, final amount {final_amount}", discounts.len());

    let commissions = match &affiliate_code {
        Some(code) => {
            let credits = affiliates::credit_commission_chain(order_id, final_amount, code, &rules.commission, conn).await?;
            if let Some(direct) = credits.first() {
                if !affiliates::link_exists(direct.affiliate_id, order.user_id, conn).await? {
                    let link = NewAffiliateClientLink::open_ended(direct.affiliate_id, order.user_id, Utc::now());
                    affiliates::insert_link(link, conn).await?;
                }
            }
            credits
        },
        None => Vec::new(),
    };

    let points_earned = points_for(final_amount, rules.order_points_multiplier);
    if points_earned > 0 {
        let entry = PointsEntry::new(order.user_id, points_earned, PointSource::Order, order_id.to_string());
        loyalty::earn(&entry, conn).await?;
    } else {
        trace!("🔄️ Order #{order_id} earns no points");
    }
    let rewards = RewardsSummary {
        points_earned: points_earned.max(0),
        points_redeemed: outcome.points_redeemed(),
        points_balance: loyalty::balance(order.user_id, conn).await?,
    };
    let pricing =
        PricingBreakdown { subtotal, total_discount: outcome.total_discount(), final_amount, degraded_lines };
    Ok(SettledOrder { order: settled_order, items, discounts, pricing, rewards, commissions })
}

pub async fn reprice_order(
    order_id: i64,
    new_manual_price: Option<Money>,
    rules: &SettlementRules,
    conn: &mut SqliteConnection,
) -> Result<PriceAdjustment, SqliteDatabaseError> {
    if let Some(price) = new_manual_price {
        if price.is_negative() {
            return Err(EngineError::invalid(format!("A manual price cannot be negative ({price})")).into());
        }
    }
    let old_order = orders::fetch_existing_order(order_id, conn).await?;
    if payments::is_paid(order_id, conn).await? {
        return Err(EngineError::OrderAlreadyPaid(order_id).into());
    }
    let old_price = old_order.effective_price();
    let new_price = new_manual_price.unwrap_or(old_order.total_amount);
    let difference = new_price - old_price;
    if difference.is_zero() {
        debug!("🔄️ The effective price of order #{order_id} is unchanged at {old_price}. Nothing to do.");
        return Ok(PriceAdjustment {
            order: old_order.clone(),
            old_order,
            old_price,
            new_price,
            points_adjustment: 0,
            commission_delta: Money::ZERO,
            affiliate_id: None,
        });
    }

    let points_adjustment = points_for(difference, rules.adjustment_points_multiplier);
    let entry = PointsEntry::new(old_order.user_id, points_adjustment.abs(), PointSource::PriceAdjustment, order_id.to_string());
    match points_adjustment {
        p if p > 0 => {
            loyalty::earn(&entry, conn).await?;
        },
        p if p < 0 => {
            loyalty::spend(&entry, conn).await?;
        },
        _ => {},
    }

    let (commission_delta, affiliate_id) = adjust_commission(&old_order, difference, rules, conn).await?;
    let order = orders::set_manual_price(order_id, new_manual_price, conn).await?;
    orders::insert_price_adjustment(order_id, old_price, new_price, points_adjustment, commission_delta, conn).await?;
    info!(
        "🔄️ Order #{order_id} repriced from {old_price} to {new_price}. Points: {points_adjustment}, commission: \
         {commission_delta}"
    );
    Ok(PriceAdjustment { old_order, order, old_price, new_price, points_adjustment, commission_delta, affiliate_id })
}

/// Applies the commission share of a price change to the order's affiliate, if it is still eligible.
async fn adjust_commission(
    order: &Order,
    difference: Money,
    rules: &SettlementRules,
    conn: &mut SqliteConnection,
) -> Result<(Money, Option<i64>), SqliteDatabaseError> {
    let Some(code) = &order.affiliate_code else {
        return Ok((Money::ZERO, None));
    };
    let affiliate = match affiliates::fetch_affiliate_by_code(code, conn).await? {
        Some(a) if a.is_eligible() => a,
        _ => {
            warn!("💸️ Affiliate {code} on order #{} is gone or inactive. The commission is left as is.", order.id);
            return Ok((Money::ZERO, None));
        },
    };
    let levels = affiliates::fetch_levels(conn).await?;
    let rate = effective_rate(&levels, affiliate.total_referrals, rules.commission.default_rate);
    let delta = commission_for(difference, rate);
    if !delta.is_zero() {
        let notes = format!("Price adjustment of {difference} on order #{} at {rate}", order.id);
        affiliates::credit(affiliate.id, order.id, delta, &notes, conn).await?;
    }
    Ok((delta, Some(affiliate.id)))
}

pub async fn change_status(
    order_id: i64,
    new_status: OrderStatusType,
    changed_by: i64,
    conn: &mut SqliteConnection,
) -> Result<(Order, Order), SqliteDatabaseError> {
    let old_order = orders::fetch_existing_order(order_id, conn).await?;
    if !old_order.status.can_transition_to(new_status) {
        return Err(EngineError::InvalidTransition { from: old_order.status.to_string(), to: new_status.to_string() }.into());
    }
    let new_order = orders::update_status(order_id, old_order.status, new_status, changed_by, conn).await?;
    Ok((old_order, new_order))
}
