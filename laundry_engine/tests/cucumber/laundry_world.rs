use std::collections::HashMap;

use cucumber::World;
use laundry_engine::{
    config::SettlementRules,
    db_types::AffiliateProfile,
    events::EventProducers,
    order_objects::SettledOrder,
    test_utils::{
        fixtures::{seed_catalog, SeededCatalog},
        prepare_env::{create_database, drop_database, random_db_path, run_migrations},
    },
    AffiliateApi,
    CatalogApi,
    EngineError,
    LoyaltyApi,
    OrderFlowApi,
    SettlementDatabase,
    SqliteDatabase,
};
use laundry_common::Money;
use log::*;

#[derive(Default, Debug, World)]
pub struct LaundryWorld {
    pub system: Option<LaundrySystem>,
}

#[derive(Debug)]
pub struct LaundrySystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub catalog: SeededCatalog,
    pub api: OrderFlowApi<SqliteDatabase>,
    pub loyalty: LoyaltyApi<SqliteDatabase>,
    pub affiliates: AffiliateApi<SqliteDatabase>,
    pub catalog_api: CatalogApi<SqliteDatabase>,
    /// Affiliates by the name the scenario gave them
    pub named_affiliates: HashMap<String, AffiliateProfile>,
    pub offers: Vec<i64>,
    pub last_order: Option<SettledOrder>,
    pub last_error: Option<EngineError>,
}

impl LaundryWorld {
    pub fn system(&self) -> &LaundrySystem {
        self.system.as_ref().expect("Laundry system not initialised")
    }

    pub fn system_mut(&mut self) -> &mut LaundrySystem {
        self.system.as_mut().expect("Laundry system not initialised")
    }
}

impl LaundrySystem {
    pub async fn new() -> Self {
        let url = prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        let catalog = seed_catalog(&db).await;
        let rules = SettlementRules::default();
        let producers = EventProducers::default();
        Self {
            api: OrderFlowApi::new(db.clone(), producers.clone(), rules),
            loyalty: LoyaltyApi::new(db.clone(), producers.clone()),
            affiliates: AffiliateApi::new(db.clone(), producers, rules.commission, Money::from_units(50)),
            catalog_api: CatalogApi::new(db.clone()),
            db_path: url,
            db,
            catalog,
            named_affiliates: HashMap::new(),
            offers: Vec::new(),
            last_order: None,
            last_error: None,
        }
    }

    pub fn affiliate(&self, name: &str) -> &AffiliateProfile {
        self.named_affiliates.get(name).unwrap_or_else(|| panic!("No affiliate called {name}"))
    }

    pub fn last_order(&self) -> &SettledOrder {
        self.last_order.as_ref().expect("No order has been placed")
    }

    /// Closes the pool and deletes the scenario's database.
    pub async fn dispose(&mut self) {
        if let Err(e) = self.db.close().await {
            error!("🚀️ Failed to close database {}: {e}", self.db_path);
        }
        drop_database(&self.db_path).await;
        debug!("🚀️ Removed database {}", self.db_path);
    }
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}
