#![allow(dead_code)]
pub mod mocks;

use laundry_common::Money;
use laundry_engine::{
    config::SettlementRules,
    db_types::{NewOrder, NewOrderItem},
    events::EventProducers,
    test_utils::{
        fixtures::{seed_catalog, SeededCatalog},
        prepare_env::{drop_database, prepare_test_env, random_db_path},
    },
    AffiliateApi,
    CatalogApi,
    LoyaltyApi,
    OrderFlowApi,
    SettlementDatabase,
    SqliteDatabase,
};
use log::*;

pub struct TestSystem {
    pub url: String,
    pub db: SqliteDatabase,
    pub catalog: SeededCatalog,
    pub orders: OrderFlowApi<SqliteDatabase>,
    pub loyalty: LoyaltyApi<SqliteDatabase>,
    pub affiliates: AffiliateApi<SqliteDatabase>,
    pub catalog_api: CatalogApi<SqliteDatabase>,
}

pub async fn setup() -> TestSystem {
    setup_with(SettlementRules::default(), EventProducers::default()).await
}

/// A single pooled connection keeps the tests deterministic. Use [`setup_with_connections`] where statements must
/// really run side by side.
pub async fn setup_with(rules: SettlementRules, producers: EventProducers) -> TestSystem {
    build(rules, producers, 1).await
}

pub async fn setup_with_connections(max_connections: u32) -> TestSystem {
    build(SettlementRules::default(), EventProducers::default(), max_connections).await
}

async fn build(rules: SettlementRules, producers: EventProducers, max_connections: u32) -> TestSystem {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, max_connections).await.expect("Error creating database");
    let catalog = seed_catalog(&db).await;
    let orders = OrderFlowApi::new(db.clone(), producers.clone(), rules);
    let loyalty = LoyaltyApi::new(db.clone(), producers.clone());
    let affiliates = AffiliateApi::new(db.clone(), producers, rules.commission, Money::from_units(5000));
    let catalog_api = CatalogApi::new(db.clone());
    TestSystem { url, db, catalog, orders, loyalty, affiliates, catalog_api }
}

pub async fn tear_down(mut system: TestSystem) {
    if let Err(e) = system.db.close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    drop_database(&system.url).await;
}

impl TestSystem {
    /// `quantity` shirts, washed at the standard rate
    pub fn shirt_order(&self, user_id: i64, quantity: i64) -> NewOrder {
        NewOrder::new(user_id, 1, self.catalog.service_type_id)
            .with_item(NewOrderItem::new(self.catalog.shirt_id, self.catalog.wash_id, quantity))
    }
}
