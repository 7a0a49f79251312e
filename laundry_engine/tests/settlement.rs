use chrono::{Duration, Utc};
use laundry_common::{Money, Percent};
use laundry_engine::{
    db_types::{
        Actor,
        Discount,
        NewAffiliateClientLink,
        NewOffer,
        NewOrder,
        NewOrderItem,
        NewService,
        NewServiceType,
        OrderStatusType,
        PointSource,
        PointTransactionType,
        PriceUpdate,
        PricingType,
        Role,
    },
    test_utils::fixtures::active_affiliate,
    EngineError,
};

mod support;

use support::{setup, tear_down};

fn ten_percent_over(minimum: Money) -> NewOffer {
    let now = Utc::now();
    NewOffer::new("Ten off", Discount::Percentage(Percent::whole(10)), now - Duration::days(1), now + Duration::days(1))
        .with_min_purchase(minimum)
}

#[tokio::test]
async fn percentage_offer_over_minimum() {
    let sys = setup().await;
    let key = sys.catalog.key(sys.catalog.shirt_id, sys.catalog.wash_id);
    sys.catalog_api
        .update_price(PriceUpdate::per_item(key, Money::from_units(1000), Money::from_units(1500)))
        .await
        .unwrap();
    let offer = sys.catalog_api.add_offer(ten_percent_over(Money::from_units(1500))).await.unwrap();

    let settled = sys.orders.create_order(sys.shirt_order(1, 2).with_offer(offer.id)).await.unwrap();
    assert_eq!(settled.pricing.subtotal, Money::from_units(2000));
    assert_eq!(settled.pricing.total_discount, Money::from_units(200));
    assert_eq!(settled.pricing.final_amount, Money::from_units(1800));
    assert_eq!(settled.pricing.degraded_lines, 0);
    assert_eq!(settled.rewards.points_earned, 1800);
    assert_eq!(settled.rewards.points_balance, 1800);
    assert_eq!(settled.order.status, OrderStatusType::Pending);
    assert_eq!(settled.order.total_amount, Money::from_units(1800));
    assert_eq!(settled.items.len(), 1);
    assert_eq!(settled.items[0].unit_price, Money::from_units(1000));
    assert_eq!(settled.discounts.len(), 1);
    assert!(settled.commissions.is_empty());

    let details = sys.orders.fetch_order_details(settled.order.id).await.unwrap();
    assert!(!details.is_paid());
    assert_eq!(details.discounts[0].amount, Money::from_units(200));
    assert_eq!(sys.loyalty.balance(1).await.unwrap(), 1800);
    tear_down(sys).await;
}

#[tokio::test]
async fn offer_below_minimum_is_ignored() {
    let sys = setup().await;
    let offer = sys.catalog_api.add_offer(ten_percent_over(Money::from_units(1500))).await.unwrap();
    // 3 shirts at 10.00
    let settled = sys.orders.create_order(sys.shirt_order(1, 3).with_offer(offer.id)).await.unwrap();
    assert_eq!(settled.pricing.final_amount, Money::from_units(30));
    assert!(settled.discounts.is_empty());
    tear_down(sys).await;
}

#[tokio::test]
async fn commission_fans_out_to_bounded_ancestors() {
    let sys = setup().await;
    // root <- gen1 <- gen2 <- gen3 <- direct
    let root = active_affiliate(&sys.db, 500, None).await;
    let gen1 = active_affiliate(&sys.db, 501, Some(&root.affiliate_code)).await;
    let gen2 = active_affiliate(&sys.db, 502, Some(&gen1.affiliate_code)).await;
    let gen3 = active_affiliate(&sys.db, 503, Some(&gen2.affiliate_code)).await;
    let direct = active_affiliate(&sys.db, 504, Some(&gen3.affiliate_code)).await;

    let order = sys.shirt_order(1, 180).with_affiliate_code(&direct.affiliate_code);
    let settled = sys.orders.create_order(order).await.unwrap();
    assert_eq!(settled.pricing.final_amount, Money::from_units(1800));
    let credits = settled.commissions;
    assert_eq!(credits.len(), 4);
    let expected = [
        (direct.id, Money::from(18_000)),
        (gen3.id, Money::from(1_800)),
        (gen2.id, Money::from(180)),
        (gen1.id, Money::from(18)),
    ];
    for (depth, (credit, (id, amount))) in credits.iter().zip(expected).enumerate() {
        assert_eq!(credit.depth, depth);
        assert_eq!(credit.affiliate_id, id);
        assert_eq!(credit.amount, amount);
    }
    assert!(sys.affiliates.history(root.id).await.unwrap().is_empty());

    let direct = sys.affiliates.summary(direct.id).await.unwrap().profile;
    assert_eq!(direct.total_referrals, 1);
    assert_eq!(direct.commission_balance, Money::from_units(180));
    let gen3 = sys.affiliates.summary(gen3.id).await.unwrap().profile;
    assert_eq!(gen3.total_referrals, 0);
    assert_eq!(gen3.commission_balance, Money::from_units(18));
    tear_down(sys).await;
}

#[tokio::test]
async fn suspended_ancestors_are_skipped() {
    let sys = setup().await;
    let root = active_affiliate(&sys.db, 500, None).await;
    let middle = active_affiliate(&sys.db, 501, Some(&root.affiliate_code)).await;
    let direct = active_affiliate(&sys.db, 502, Some(&middle.affiliate_code)).await;
    sys.affiliates.suspend(middle.id).await.unwrap();

    let settled =
        sys.orders.create_order(sys.shirt_order(1, 180).with_affiliate_code(&direct.affiliate_code)).await.unwrap();
    let recipients = settled.commissions.iter().map(|c| (c.affiliate_id, c.depth)).collect::<Vec<_>>();
    assert_eq!(recipients, vec![(direct.id, 0), (root.id, 2)]);
    assert_eq!(settled.commissions[1].amount, Money::from(180));
    assert!(sys.affiliates.history(middle.id).await.unwrap().is_empty());
    tear_down(sys).await;
}

#[tokio::test]
async fn failed_points_credit_rolls_back_everything() {
    let sys = setup().await;
    let affiliate = active_affiliate(&sys.db, 500, None).await;
    sqlx::query(
        r#"
        CREATE TRIGGER refuse_points BEFORE INSERT ON point_transactions
        WHEN NEW.transaction_type = 'EARNED'
        BEGIN
            SELECT RAISE(ABORT, 'points ledger is read-only');
        END;
        "#,
    )
    .execute(sys.db.pool())
    .await
    .unwrap();

    let order = sys.shirt_order(1, 5).with_affiliate_code(&affiliate.affiliate_code);
    let err = sys.orders.create_order(order).await.unwrap_err();
    assert!(matches!(err, EngineError::DatabaseError(_)), "{err}");

    assert!(sys.orders.orders_for_user(1).await.unwrap().is_empty());
    assert!(sys.affiliates.history(affiliate.id).await.unwrap().is_empty());
    let affiliate = sys.affiliates.summary(affiliate.id).await.unwrap().profile;
    assert_eq!(affiliate.commission_balance, Money::ZERO);
    assert_eq!(affiliate.total_referrals, 0);
    assert!(sys.affiliates.active_link_for_client(1).await.unwrap().is_none());
    assert_eq!(sys.loyalty.balance(1).await.unwrap(), 0);
    let orders = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders").fetch_one(sys.db.pool()).await.unwrap();
    assert_eq!(orders, 0);
    tear_down(sys).await;
}

#[tokio::test]
async fn paid_orders_cannot_be_repriced() {
    let sys = setup().await;
    let settled = sys.orders.create_order(sys.shirt_order(1, 10)).await.unwrap();
    let order_id = settled.order.id;
    let payment = sys.orders.mark_order_paid(order_id).await.unwrap();
    assert!(payment.is_paid);
    assert!(payment.paid_at.is_some());

    let err = sys.orders.adjust_order_price(order_id, Some(Money::from_units(50))).await.unwrap_err();
    assert_eq!(err, EngineError::OrderAlreadyPaid(order_id));
    let err = sys.orders.mark_order_paid(order_id).await.unwrap_err();
    assert_eq!(err, EngineError::OrderAlreadyPaid(order_id));

    let details = sys.orders.fetch_order_details(order_id).await.unwrap();
    assert_eq!(details.order, settled.order);
    assert!(sys.orders.price_adjustments(order_id).await.unwrap().is_empty());
    assert_eq!(sys.loyalty.balance(1).await.unwrap(), 100);
    tear_down(sys).await;
}

#[tokio::test]
async fn price_adjustment_moves_points_and_commission() {
    let sys = setup().await;
    let affiliate = active_affiliate(&sys.db, 500, None).await;
    let order = sys.shirt_order(1, 180).with_affiliate_code(&affiliate.affiliate_code);
    let order_id = sys.orders.create_order(order).await.unwrap().order.id;

    let adjustment = sys.orders.adjust_order_price(order_id, Some(Money::from_units(1500))).await.unwrap();
    assert_eq!(adjustment.old_price, Money::from_units(1800));
    assert_eq!(adjustment.new_price, Money::from_units(1500));
    assert_eq!(adjustment.points_adjustment, -300);
    assert_eq!(adjustment.commission_delta, Money::from_units(-30));
    assert_eq!(adjustment.affiliate_id, Some(affiliate.id));
    assert_eq!(adjustment.order.manual_price, Some(Money::from_units(1500)));
    assert_eq!(adjustment.order.total_amount, Money::from_units(1800));
    assert_eq!(sys.loyalty.balance(1).await.unwrap(), 1500);
    let profile = sys.affiliates.summary(affiliate.id).await.unwrap().profile;
    assert_eq!(profile.commission_balance, Money::from_units(150));

    // Setting the same price again changes nothing
    let noop = sys.orders.adjust_order_price(order_id, Some(Money::from_units(1500))).await.unwrap();
    assert!(noop.is_noop());

    // Clearing the manual price restores the computed total
    let restored = sys.orders.adjust_order_price(order_id, None).await.unwrap();
    assert_eq!(restored.points_adjustment, 300);
    assert_eq!(restored.order.manual_price, None);
    assert_eq!(sys.loyalty.balance(1).await.unwrap(), 1800);

    let history = sys.loyalty.history(1).await.unwrap();
    let adjustments = history.iter().filter(|t| t.source == PointSource::PriceAdjustment).collect::<Vec<_>>();
    assert_eq!(adjustments.len(), 2);
    assert!(adjustments.iter().all(|t| t.reference_id == order_id.to_string()));
    let audit = sys.orders.price_adjustments(order_id).await.unwrap();
    assert_eq!(audit.len(), 2);
    assert_eq!(audit[0].commission_delta, Money::from_units(-30));
    tear_down(sys).await;
}

#[tokio::test]
async fn price_cut_beyond_point_balance_is_refused() {
    let sys = setup().await;
    let order_id = sys.orders.create_order(sys.shirt_order(1, 10)).await.unwrap().order.id;
    sys.loyalty.spend_points(1, 90, PointSource::Admin, "manual correction").await.unwrap();

    let err = sys.orders.adjust_order_price(order_id, Some(Money::from_units(50))).await.unwrap_err();
    assert_eq!(err, EngineError::InsufficientPoints { available: 10, requested: 50 });
    let order = sys.orders.fetch_order_details(order_id).await.unwrap().order;
    assert_eq!(order.manual_price, None);
    tear_down(sys).await;
}

#[tokio::test]
async fn active_link_supplies_the_affiliate_code() {
    let sys = setup().await;
    let affiliate = active_affiliate(&sys.db, 500, None).await;
    let start = Utc::now() - Duration::days(3);
    sys.affiliates.link_client(NewAffiliateClientLink::open_ended(affiliate.id, 1, start)).await.unwrap();

    let settled = sys.orders.create_order(sys.shirt_order(1, 10)).await.unwrap();
    assert_eq!(settled.order.affiliate_code.as_deref(), Some(affiliate.affiliate_code.as_str()));
    assert_eq!(settled.commissions.len(), 1);
    assert_eq!(settled.commissions[0].amount, Money::from_units(10));

    // Another customer without a link pays no commission
    let settled = sys.orders.create_order(sys.shirt_order(2, 10)).await.unwrap();
    assert_eq!(settled.order.affiliate_code, None);
    assert!(settled.commissions.is_empty());
    tear_down(sys).await;
}

#[tokio::test]
async fn expired_links_are_ignored() {
    let sys = setup().await;
    let affiliate = active_affiliate(&sys.db, 500, None).await;
    let start = Utc::now() - Duration::days(30);
    let link = NewAffiliateClientLink::open_ended(affiliate.id, 1, start).until(Utc::now() - Duration::days(1));
    sys.affiliates.link_client(link).await.unwrap();

    let settled = sys.orders.create_order(sys.shirt_order(1, 10)).await.unwrap();
    assert_eq!(settled.order.affiliate_code, None);
    tear_down(sys).await;
}

#[tokio::test]
async fn first_referred_order_links_the_client() {
    let sys = setup().await;
    let affiliate = active_affiliate(&sys.db, 500, None).await;
    assert!(sys.affiliates.active_link_for_client(1).await.unwrap().is_none());

    sys.orders.create_order(sys.shirt_order(1, 10).with_affiliate_code(&affiliate.affiliate_code)).await.unwrap();
    let link = sys.affiliates.active_link_for_client(1).await.unwrap().expect("link was not created");
    assert_eq!(link.affiliate_id, affiliate.id);
    assert_eq!(link.end_date, None);

    // The next order needs no code
    let settled = sys.orders.create_order(sys.shirt_order(1, 10)).await.unwrap();
    assert_eq!(settled.commissions.len(), 1);
    let profile = sys.affiliates.summary(affiliate.id).await.unwrap().profile;
    assert_eq!(profile.total_referrals, 2);
    tear_down(sys).await;
}

#[tokio::test]
async fn unusable_affiliate_codes_are_rejected() {
    let sys = setup().await;
    let err = sys.orders.create_order(sys.shirt_order(1, 1).with_affiliate_code("NOSUCHCODE")).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)), "{err}");

    let pending = sys.affiliates.register(laundry_engine::db_types::NewAffiliate::new(500)).await.unwrap();
    let err =
        sys.orders.create_order(sys.shirt_order(1, 1).with_affiliate_code(&pending.affiliate_code)).await.unwrap_err();
    assert!(matches!(err, EngineError::InactiveResource(_)), "{err}");
    assert!(sys.orders.orders_for_user(1).await.unwrap().is_empty());
    tear_down(sys).await;
}

#[tokio::test]
async fn deleted_articles_cannot_be_ordered() {
    let sys = setup().await;
    sys.catalog_api.delete_article(sys.catalog.shirt_id).await.unwrap();
    let err = sys.orders.create_order(sys.shirt_order(1, 2)).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)), "{err}");
    assert!(sys.orders.orders_for_user(1).await.unwrap().is_empty());
    tear_down(sys).await;
}

#[tokio::test]
async fn unavailable_prices_cannot_be_ordered() {
    let sys = setup().await;
    let key = sys.catalog.key(sys.catalog.shirt_id, sys.catalog.wash_id);
    sys.catalog_api.set_availability(&key, false).await.unwrap();
    let err = sys.orders.create_order(sys.shirt_order(1, 2)).await.unwrap_err();
    assert!(matches!(err, EngineError::InactiveResource(_)), "{err}");
    sys.catalog_api.set_availability(&key, true).await.unwrap();
    assert!(sys.orders.create_order(sys.shirt_order(1, 2)).await.is_ok());
    tear_down(sys).await;
}

#[tokio::test]
async fn missing_price_rows_are_provisioned() {
    let sys = setup().await;
    let order = NewOrder::new(1, 1, sys.catalog.service_type_id)
        .with_item(NewOrderItem::new(sys.catalog.duvet_id, sys.catalog.iron_id, 2));
    let settled = sys.orders.create_order(order).await.unwrap();
    assert_eq!(settled.items[0].unit_price, Money::from_units(1));
    assert_eq!(settled.pricing.final_amount, Money::from_units(2));

    let price = sys.catalog_api.price(&sys.catalog.key(sys.catalog.duvet_id, sys.catalog.iron_id)).await.unwrap();
    assert_eq!(price.base_price, Money::from_units(1));
    assert_eq!(price.premium_price, Money::from_units(1));
    assert!(price.is_available);
    tear_down(sys).await;
}

#[tokio::test]
async fn missing_weighed_price_rows_are_provisioned() {
    let sys = setup().await;
    let by_weight = sys.catalog_api.add_service_type(NewServiceType::new("Bulk", PricingType::PerWeight)).await.unwrap();
    let bulk_wash = sys.catalog_api.add_service(NewService::new("Bulk wash", by_weight.id)).await.unwrap();
    let order = NewOrder::new(1, 1, by_weight.id).with_item(NewOrderItem::weighed(sys.catalog.duvet_id, bulk_wash.id, 3.0));
    let settled = sys.orders.create_order(order).await.unwrap();
    assert_eq!(settled.items[0].unit_price, Money::from_units(1));
    assert_eq!(settled.pricing.final_amount, Money::from_units(3));

    let key = laundry_engine::db_types::PriceKey::new(sys.catalog.duvet_id, by_weight.id, bulk_wash.id);
    let price = sys.catalog_api.price(&key).await.unwrap();
    assert_eq!(price.price_per_kg, Some(Money::from_units(1)));
    tear_down(sys).await;
}

#[tokio::test]
async fn price_edits_are_seen_by_the_next_order() {
    let sys = setup().await;
    let key = sys.catalog.key(sys.catalog.shirt_id, sys.catalog.wash_id);
    // Warm the cache
    assert_eq!(sys.catalog_api.price(&key).await.unwrap().base_price, Money::from_units(10));
    sys.orders.create_order(sys.shirt_order(1, 1)).await.unwrap();
    sys.catalog_api.update_price(PriceUpdate::per_item(key, Money::from_units(12), Money::from_units(18))).await.unwrap();
    let settled = sys.orders.create_order(sys.shirt_order(1, 1)).await.unwrap();
    assert_eq!(settled.pricing.final_amount, Money::from_units(12));
    tear_down(sys).await;
}

#[tokio::test]
async fn oversized_orders_are_rejected() {
    let sys = setup().await;
    let err = sys.orders.create_order(sys.shirt_order(1, 100_000_000_000_000)).await.unwrap_err();
    assert!(matches!(err, EngineError::ValidationError(_)), "{err}");

    // Each line fits, but the subtotal does not
    let huge = Money::from(i64::MAX / 2 + 1);
    let key = sys.catalog.key(sys.catalog.shirt_id, sys.catalog.wash_id);
    sys.catalog_api.update_price(PriceUpdate::per_item(key, huge, huge)).await.unwrap();
    let order = sys.shirt_order(1, 1).with_item(NewOrderItem::new(sys.catalog.shirt_id, sys.catalog.wash_id, 1));
    let err = sys.orders.create_order(order).await.unwrap_err();
    assert!(matches!(err, EngineError::ValidationError(_)), "{err}");
    assert!(sys.orders.orders_for_user(1).await.unwrap().is_empty());
    tear_down(sys).await;
}

#[tokio::test]
async fn offers_with_negative_limits_are_refused() {
    let sys = setup().await;
    let now = Utc::now();
    let fixed = Discount::FixedAmount(Money::from_units(10));
    let offer = NewOffer::new("Negative cap", fixed, now - Duration::days(1), now + Duration::days(1));
    let err = sys.catalog_api.add_offer(offer.clone().with_max_discount(Money::from_units(-500))).await.unwrap_err();
    assert!(matches!(err, EngineError::ValidationError(_)), "{err}");
    let err = sys.catalog_api.add_offer(offer.with_min_purchase(Money::from_units(-1))).await.unwrap_err();
    assert!(matches!(err, EngineError::ValidationError(_)), "{err}");
    tear_down(sys).await;
}

#[tokio::test]
async fn weighed_items_are_priced_per_kilogram() {
    let sys = setup().await;
    let order = NewOrder::new(1, 1, sys.catalog.service_type_id)
        .with_item(NewOrderItem::weighed(sys.catalog.duvet_id, sys.catalog.wash_id, 2.5))
        .with_item(NewOrderItem::new(sys.catalog.shirt_id, sys.catalog.iron_id, 2).premium());
    let settled = sys.orders.create_order(order).await.unwrap();
    assert_eq!(settled.items[0].line_total, Money::from(1250));
    assert_eq!(settled.items[1].line_total, Money::from_units(8));
    assert_eq!(settled.pricing.subtotal, Money::from(2050));
    // 20.50 earns 20 points
    assert_eq!(settled.rewards.points_earned, 20);

    let order = NewOrder::new(1, 1, sys.catalog.service_type_id)
        .with_item(NewOrderItem::new(sys.catalog.duvet_id, sys.catalog.wash_id, 1));
    let err = sys.orders.create_order(order).await.unwrap_err();
    assert!(matches!(err, EngineError::MissingConfiguration(_)), "{err}");
    tear_down(sys).await;
}

#[tokio::test]
async fn points_exchange_offers_spend_points() {
    let sys = setup().await;
    sys.loyalty.earn_points(1, 500, PointSource::Admin, "welcome bonus").await.unwrap();
    let now = Utc::now();
    let discount = Discount::PointsExchange { value: Money::from_units(50), points_required: 200 };
    let offer = NewOffer::new("Fifty for 200", discount, now - Duration::days(1), now + Duration::days(1));
    let offer = sys.catalog_api.add_offer(offer).await.unwrap();

    let settled = sys.orders.create_order(sys.shirt_order(1, 10).with_offer(offer.id)).await.unwrap();
    assert_eq!(settled.pricing.final_amount, Money::from_units(50));
    assert_eq!(settled.rewards.points_redeemed, 200);
    assert_eq!(settled.rewards.points_earned, 50);
    assert_eq!(settled.rewards.points_balance, 350);
    assert_eq!(settled.discounts[0].points_spent, 200);

    let history = sys.loyalty.history(1).await.unwrap();
    let redemption = history.iter().find(|t| t.source == PointSource::OfferRedemption).expect("no redemption row");
    assert_eq!(redemption.points, -200);
    assert_eq!(redemption.transaction_type, PointTransactionType::Spent);
    assert_eq!(redemption.reference_id, settled.order.id.to_string());
    tear_down(sys).await;
}

#[tokio::test]
async fn unknown_offers_abort_settlement() {
    let sys = setup().await;
    let err = sys.orders.create_order(sys.shirt_order(1, 2).with_offer(9999)).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)), "{err}");
    assert!(sys.orders.orders_for_user(1).await.unwrap().is_empty());
    tear_down(sys).await;
}

#[tokio::test]
async fn invalid_orders_are_rejected_before_storage() {
    let sys = setup().await;
    let empty = NewOrder::new(1, 1, sys.catalog.service_type_id);
    assert!(matches!(sys.orders.create_order(empty).await, Err(EngineError::ValidationError(_))));
    let zero = sys.shirt_order(1, 0);
    assert!(matches!(sys.orders.create_order(zero).await, Err(EngineError::ValidationError(_))));
    let no_payment = sys.shirt_order(1, 1).with_payment_method("  ");
    assert!(matches!(sys.orders.create_order(no_payment).await, Err(EngineError::ValidationError(_))));
    tear_down(sys).await;
}

#[tokio::test]
async fn status_follows_the_lifecycle() {
    let sys = setup().await;
    let order_id = sys.orders.create_order(sys.shirt_order(1, 2)).await.unwrap().order.id;
    let admin = Actor::new(900, Role::Admin);
    let driver = Actor::new(901, Role::Delivery);
    let client = Actor::new(1, Role::Client);

    let err = sys.orders.update_order_status(order_id, OrderStatusType::Collecting, &client).await.unwrap_err();
    assert!(matches!(err, EngineError::InsufficientPermissions(_)));
    let err = sys.orders.update_order_status(order_id, OrderStatusType::Ready, &admin).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition { .. }), "{err}");

    let order = sys.orders.update_order_status(order_id, OrderStatusType::Collecting, &driver).await.unwrap();
    assert_eq!(order.status, OrderStatusType::Collecting);
    let order = sys.orders.update_order_status(order_id, OrderStatusType::Cancelled, &admin).await.unwrap();
    assert_eq!(order.status, OrderStatusType::Cancelled);
    let err = sys.orders.update_order_status(order_id, OrderStatusType::Pending, &admin).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition { .. }));

    let history = sys.orders.fetch_order_details(order_id).await.unwrap().status_history;
    let changes = history.iter().map(|h| (h.old_status, h.new_status, h.changed_by)).collect::<Vec<_>>();
    assert_eq!(changes, vec![
        (OrderStatusType::Pending, OrderStatusType::Collecting, 901),
        (OrderStatusType::Collecting, OrderStatusType::Cancelled, 900),
    ]);

    let err = sys.orders.update_order_status(9999, OrderStatusType::Collecting, &admin).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
    tear_down(sys).await;
}
