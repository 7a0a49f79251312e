//! A small, known catalog for tests.
use laundry_common::Money;

use crate::{
    db_types::{
        AffiliateProfile,
        AffiliateStatus,
        NewAffiliate,
        NewService,
        NewServiceType,
        PriceKey,
        PriceUpdate,
        PricingType,
    },
    AffiliateManagement,
    CatalogManagement,
    SqliteDatabase,
};

/// Ids of the seeded catalog rows.
///
/// | Article | Service | Pricing                       |
/// |---------|---------|-------------------------------|
/// | Shirt   | Wash    | per item, 10.00 / 15.00 prem. |
/// | Shirt   | Iron    | per item, 3.00 / 4.00 prem.   |
/// | Duvet   | Wash    | per weight, 5.00 per kg       |
#[derive(Debug, Clone, Copy)]
pub struct SeededCatalog {
    pub service_type_id: i64,
    pub wash_id: i64,
    pub iron_id: i64,
    pub shirt_id: i64,
    pub duvet_id: i64,
}

impl SeededCatalog {
    pub fn key(&self, article_id: i64, service_id: i64) -> PriceKey {
        PriceKey::new(article_id, self.service_type_id, service_id)
    }
}

pub async fn seed_catalog(db: &SqliteDatabase) -> SeededCatalog {
    let service_type = db
        .insert_service_type(NewServiceType::new("Standard", PricingType::PerItem))
        .await
        .expect("Error creating service type");
    let wash = db.insert_service(NewService::new("Wash", service_type.id)).await.expect("Error creating service");
    let iron = db.insert_service(NewService::new("Iron", service_type.id)).await.expect("Error creating service");
    let shirt = db.insert_article("Shirt").await.expect("Error creating article");
    let duvet = db.insert_article("Duvet").await.expect("Error creating article");
    let catalog = SeededCatalog {
        service_type_id: service_type.id,
        wash_id: wash.id,
        iron_id: iron.id,
        shirt_id: shirt.id,
        duvet_id: duvet.id,
    };
    let updates = [
        PriceUpdate::per_item(catalog.key(shirt.id, wash.id), Money::from_units(10), Money::from_units(15)),
        PriceUpdate::per_item(catalog.key(shirt.id, iron.id), Money::from_units(3), Money::from_units(4)),
        PriceUpdate::per_weight(catalog.key(duvet.id, wash.id), Money::from_units(5)),
    ];
    for update in updates {
        db.upsert_price(update).await.expect("Error setting price");
    }
    catalog
}

/// Registers and activates an affiliate for `user_id`, optionally under `parent_code`.
pub async fn active_affiliate(db: &SqliteDatabase, user_id: i64, parent_code: Option<&str>) -> AffiliateProfile {
    let mut affiliate = NewAffiliate::new(user_id);
    if let Some(code) = parent_code {
        affiliate = affiliate.with_parent_code(code);
    }
    let profile = db.insert_affiliate(affiliate).await.expect("Error registering affiliate");
    db.update_affiliate_status(profile.id, AffiliateStatus::Active)
        .await
        .expect("Error activating affiliate")
}
