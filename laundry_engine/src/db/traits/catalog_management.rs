use crate::{
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

#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    async fn insert_service_type(&self, service_type: NewServiceType) -> Result<ServiceType, EngineError>;

    async fn insert_service(&self, service: NewService) -> Result<Service, EngineError>;

    async fn insert_article(&self, name: &str) -> Result<Article, EngineError>;

    async fn fetch_article(&self, article_id: i64) -> Result<Option<Article>, EngineError>;

    /// Marks the article as deleted. Existing orders keep their items; new orders referencing it are refused.
    async fn soft_delete_article(&self, article_id: i64) -> Result<Article, EngineError>;

    /// Fetches the price row for the exact triple. If there is none, a placeholder row is created using the service
    /// type's default pricing type.
    async fn fetch_or_create_price(&self, key: &PriceKey) -> Result<ArticleServicePrice, EngineError>;

    /// Creates or replaces the price row for `update.key`. Cached lookups for that key are dropped once the change
    /// commits.
    async fn upsert_price(&self, update: PriceUpdate) -> Result<ArticleServicePrice, EngineError>;

    async fn set_price_availability(&self, key: &PriceKey, is_available: bool) -> Result<ArticleServicePrice, EngineError>;

    async fn insert_offer(&self, offer: NewOffer) -> Result<Offer, EngineError>;

    /// Offers with the given ids. Unknown ids are ignored.
    async fn fetch_offers(&self, offer_ids: &[i64]) -> Result<Vec<Offer>, EngineError>;
}
