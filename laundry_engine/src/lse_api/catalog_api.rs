use std::fmt::Debug;

use log::*;

use crate::{
    calculators::pricing::{price_line, LinePrice},
    db::traits::CatalogManagement,
    db_types::{
        Article,
        ArticleServicePrice,
        NewOffer,
        NewService,
        NewServiceType,
        Offer,
        PriceKey,
        PriceUpdate,
        Service,
        ServiceType,
    },
    lse_api::errors::EngineError,
};

/// Catalog administration and price quotes.
pub struct CatalogApi<B> {
    db: B,
}

impl<B> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi")
    }
}

impl<B> CatalogApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> CatalogApi<B>
where B: CatalogManagement
{
    /// Prices a single line without placing an order. A missing price row is provisioned, exactly as it would be
    /// during settlement.
    pub async fn quote(
        &self,
        key: &PriceKey,
        quantity: i64,
        weight: Option<f64>,
        is_premium: bool,
    ) -> Result<LinePrice, EngineError> {
        let price = self.db.fetch_or_create_price(key).await?;
        price_line(&price, quantity, weight, is_premium)
    }

    pub async fn price(&self, key: &PriceKey) -> Result<ArticleServicePrice, EngineError> {
        self.db.fetch_or_create_price(key).await
    }

    pub async fn update_price(&self, update: PriceUpdate) -> Result<ArticleServicePrice, EngineError> {
        update.validate().map_err(EngineError::ValidationError)?;
        let price = self.db.upsert_price(update).await?;
        info!("🧮️ The {} is now {} ({})", price.key(), price.base_price, price.pricing_type);
        Ok(price)
    }

    pub async fn set_availability(&self, key: &PriceKey, is_available: bool) -> Result<ArticleServicePrice, EngineError> {
        self.db.set_price_availability(key, is_available).await
    }

    pub async fn add_service_type(&self, service_type: NewServiceType) -> Result<ServiceType, EngineError> {
        self.db.insert_service_type(service_type).await
    }

    pub async fn add_service(&self, service: NewService) -> Result<Service, EngineError> {
        self.db.insert_service(service).await
    }

    pub async fn add_article(&self, name: &str) -> Result<Article, EngineError> {
        if name.trim().is_empty() {
            return Err(EngineError::invalid("An article needs a name"));
        }
        self.db.insert_article(name.trim()).await
    }

    pub async fn delete_article(&self, article_id: i64) -> Result<Article, EngineError> {
        self.db.soft_delete_article(article_id).await
    }

    pub async fn add_offer(&self, offer: NewOffer) -> Result<Offer, EngineError> {
        offer.validate().map_err(EngineError::ValidationError)?;
        self.db.insert_offer(offer).await
    }

    pub async fn offers(&self, offer_ids: &[i64]) -> Result<Vec<Offer>, EngineError> {
        self.db.fetch_offers(offer_ids).await
    }
}
