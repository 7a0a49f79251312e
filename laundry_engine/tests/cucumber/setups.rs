use cucumber::given;
use laundry_common::{Money, Percent};
use laundry_engine::{
    db_types::{Discount, NewOffer, PointSource, PriceUpdate},
    test_utils::fixtures::active_affiliate,
};

use crate::cucumber::{laundry_world::LaundrySystem, LaundryWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut LaundryWorld) {
    let system = LaundrySystem::new().await;
    world.system = Some(system);
}

#[given(expr = "washing a shirt costs {int}")]
async fn shirt_wash_price(world: &mut LaundryWorld, price: i64) {
    let sys = world.system();
    let key = sys.catalog.key(sys.catalog.shirt_id, sys.catalog.wash_id);
    let update = PriceUpdate::per_item(key, Money::from_units(price), Money::from_units(price));
    sys.catalog_api.update_price(update).await.expect("Error setting price");
}

#[given(expr = "a {int}% offer on orders of at least {int}")]
async fn percentage_offer(world: &mut LaundryWorld, percent: i64, minimum: i64) {
    let now = chrono::Utc::now();
    let offer = NewOffer::new(
        format!("{percent}% off"),
        Discount::Percentage(Percent::whole(percent)),
        now - chrono::Duration::days(1),
        now + chrono::Duration::days(1),
    )
    .with_min_purchase(Money::from_units(minimum));
    let offer = world.system().catalog_api.add_offer(offer).await.expect("Error creating offer");
    world.system_mut().offers.push(offer.id);
}

#[given(expr = "an offer of {int} off for {int} points")]
async fn points_offer(world: &mut LaundryWorld, value: i64, points: i64) {
    let now = chrono::Utc::now();
    let discount = Discount::PointsExchange { value: Money::from_units(value), points_required: points };
    let offer = NewOffer::new("Points swap", discount, now - chrono::Duration::days(1), now + chrono::Duration::days(1));
    let offer = world.system().catalog_api.add_offer(offer).await.expect("Error creating offer");
    world.system_mut().offers.push(offer.id);
}

#[given(expr = "customer {int} has {int} points")]
async fn customer_points(world: &mut LaundryWorld, customer: i64, points: i64) {
    world.system().loyalty.earn_points(customer, points, PointSource::Admin, "setup").await.expect("Error adding points");
}

#[given(expr = "affiliate '{word}' is active")]
async fn root_affiliate(world: &mut LaundryWorld, name: String) {
    add_affiliate(world, name, None).await;
}

#[given(expr = "affiliate '{word}' is active under '{word}'")]
async fn child_affiliate(world: &mut LaundryWorld, name: String, parent: String) {
    let parent_code = world.system().affiliate(&parent).affiliate_code.clone();
    add_affiliate(world, name, Some(parent_code)).await;
}

#[given(expr = "affiliate '{word}' is suspended")]
async fn suspend_affiliate(world: &mut LaundryWorld, name: String) {
    let sys = world.system_mut();
    let id = sys.affiliate(&name).id;
    let profile = sys.affiliates.suspend(id).await.expect("Error suspending affiliate");
    sys.named_affiliates.insert(name, profile);
}

async fn add_affiliate(world: &mut LaundryWorld, name: String, parent_code: Option<String>) {
    let sys = world.system_mut();
    let user_id = 1000 + sys.named_affiliates.len() as i64;
    let profile = active_affiliate(&sys.db, user_id, parent_code.as_deref()).await;
    sys.named_affiliates.insert(name, profile);
}
