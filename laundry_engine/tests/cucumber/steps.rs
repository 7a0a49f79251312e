use std::str::FromStr;

use cucumber::{then, when};
use laundry_common::Money;
use laundry_engine::{
    db_types::{Actor, NewOrder, NewOrderItem, OrderStatusType, Role},
    EngineError,
};

use crate::cucumber::LaundryWorld;

fn shirts(world: &LaundryWorld, customer: i64, quantity: i64) -> NewOrder {
    let catalog = world.system().catalog;
    NewOrder::new(customer, 1, catalog.service_type_id)
        .with_item(NewOrderItem::new(catalog.shirt_id, catalog.wash_id, quantity))
}

async fn place(world: &mut LaundryWorld, order: NewOrder) {
    let result = world.system().api.create_order(order).await;
    let sys = world.system_mut();
    match result {
        Ok(settled) => {
            sys.last_order = Some(settled);
            sys.last_error = None;
        },
        Err(e) => sys.last_error = Some(e),
    }
}

#[when(expr = "customer {int} orders {int} shirts for washing")]
async fn order_shirts(world: &mut LaundryWorld, customer: i64, quantity: i64) {
    let order = shirts(world, customer, quantity);
    place(world, order).await;
}

#[when(expr = "customer {int} orders {int} shirts for washing with the offers")]
async fn order_shirts_with_offers(world: &mut LaundryWorld, customer: i64, quantity: i64) {
    let mut order = shirts(world, customer, quantity);
    for offer_id in world.system().offers.clone() {
        order = order.with_offer(offer_id);
    }
    place(world, order).await;
}

#[when(expr = "customer {int} orders {int} shirts for washing through '{word}'")]
async fn order_shirts_through(world: &mut LaundryWorld, customer: i64, quantity: i64, affiliate: String) {
    let code = world.system().affiliate(&affiliate).affiliate_code.clone();
    let order = shirts(world, customer, quantity).with_affiliate_code(code);
    place(world, order).await;
}

#[when("the order is paid")]
async fn pay_order(world: &mut LaundryWorld) {
    let sys = world.system();
    sys.api.mark_order_paid(sys.last_order().order.id).await.expect("Error marking order paid");
}

#[when(expr = "the order price is changed to {word}")]
async fn change_price(world: &mut LaundryWorld, price: String) {
    let price = Money::from_str(&price).expect("Not a valid amount");
    let order_id = world.system().last_order().order.id;
    let result = world.system().api.adjust_order_price(order_id, Some(price)).await;
    world.system_mut().last_error = result.err();
}

#[when(expr = "the {word} moves the order to {word}")]
async fn move_order(world: &mut LaundryWorld, role: String, status: String) {
    let role = Role::from_str(&role).expect("Unknown role");
    let status = OrderStatusType::from_str(&status).expect("Unknown status");
    let order_id = world.system().last_order().order.id;
    let result = world.system().api.update_order_status(order_id, status, &Actor::new(900, role)).await;
    world.system_mut().last_error = result.err();
}

#[then(expr = "the order total is {word}")]
async fn order_total(world: &mut LaundryWorld, amount: String) {
    let expected = Money::from_str(&amount).expect("Not a valid amount");
    let sys = world.system();
    let order = sys.api.fetch_order_details(sys.last_order().order.id).await.expect("Error fetching order").order;
    assert_eq!(order.effective_price(), expected);
}

#[then(expr = "the discount is {word}")]
async fn order_discount(world: &mut LaundryWorld, amount: String) {
    let expected = Money::from_str(&amount).expect("Not a valid amount");
    assert_eq!(world.system().last_order().pricing.total_discount, expected);
}

#[then(expr = "the order is {word}")]
async fn order_status(world: &mut LaundryWorld, status: String) {
    let expected = OrderStatusType::from_str(&status).expect("Unknown status");
    let sys = world.system();
    let order = sys.api.fetch_order_details(sys.last_order().order.id).await.expect("Error fetching order").order;
    assert_eq!(order.status, expected);
}

#[then(expr = "customer {int} has a balance of {int} points")]
async fn points_balance(world: &mut LaundryWorld, customer: i64, points: i64) {
    let balance = world.system().loyalty.balance(customer).await.expect("Error fetching balance");
    assert_eq!(balance, points);
}

#[then(expr = "affiliate '{word}' has a commission balance of {word}")]
async fn commission_balance(world: &mut LaundryWorld, name: String, amount: String) {
    let expected = Money::from_str(&amount).expect("Not a valid amount");
    let sys = world.system();
    let summary = sys.affiliates.summary(sys.affiliate(&name).id).await.expect("Error fetching affiliate");
    assert_eq!(summary.profile.commission_balance, expected);
}

#[then(expr = "the order paid {int} commission credits")]
async fn commission_credits(world: &mut LaundryWorld, count: usize) {
    assert_eq!(world.system().last_order().commissions.len(), count);
}

#[then(expr = "the request fails with {word}")]
async fn request_fails(world: &mut LaundryWorld, kind: String) {
    let err = world.system().last_error.as_ref().expect("The request did not fail");
    let actual = match err {
        EngineError::DatabaseError(_) => "DatabaseError",
        EngineError::NotFound(_) => "NotFound",
        EngineError::ValidationError(_) => "ValidationError",
        EngineError::InsufficientPoints { .. } => "InsufficientPoints",
        EngineError::InsufficientCommission { .. } => "InsufficientCommission",
        EngineError::InvalidTransition { .. } => "InvalidTransition",
        EngineError::InactiveResource(_) => "InactiveResource",
        EngineError::MissingConfiguration(_) => "MissingConfiguration",
        EngineError::OrderAlreadyPaid(_) => "OrderAlreadyPaid",
        EngineError::InsufficientPermissions(_) => "InsufficientPermissions",
        EngineError::NegativeBalanceInvariantViolation { .. } => "NegativeBalanceInvariantViolation",
    };
    assert_eq!(actual, kind, "{err}");
}
