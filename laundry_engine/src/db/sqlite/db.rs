use std::{fmt::Debug, time::Duration};

use chrono::{DateTime, Utc};
use laundry_common::Money;
use log::*;
use sqlx::SqlitePool;

use super::{
    affiliates,
    catalog,
    db_url,
    loyalty,
    new_pool,
    offers,
    orders,
    payments,
    settlement,
    SqliteDatabaseError,
};
use crate::{
    config::{CommissionRules, SettlementRules, DEFAULT_MAX_CONNECTIONS, DEFAULT_PRICE_CACHE_TTL},
    db::traits::{AffiliateManagement, CatalogManagement, LoyaltyManagement, OrderManagement, SettlementDatabase},
    db_types::{
        AffiliateClientLink,
        AffiliateLevel,
        AffiliateProfile,
        AffiliateStatus,
        Article,
        ArticleServicePrice,
        CommissionStatus,
        CommissionTransaction,
        LoyaltyAccount,
        NewAffiliate,
        NewAffiliateClientLink,
        NewAffiliateLevel,
        NewOffer,
        NewOrder,
        NewService,
        NewServiceType,
        Offer,
        Order,
        OrderPayment,
        OrderStatusType,
        PointTransaction,
        PointsEntry,
        PriceAdjustmentRecord,
        PriceKey,
        PriceUpdate,
        Service,
        ServiceType,
    },
    lse_api::{
        affiliate_objects::CommissionCredit,
        errors::EngineError,
        order_objects::{OrderDetails, PriceAdjustment, SettledOrder},
    },
    price_cache::PriceCache,
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
    price_cache: PriceCache,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?}, {} cached prices)", self.pool, self.price_cache.len())
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using `LDY_DATABASE_URL` and the default pool and cache settings.
    pub async fn new() -> Result<Self, SqliteDatabaseError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), DEFAULT_MAX_CONNECTIONS).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool, price_cache: PriceCache::new(DEFAULT_PRICE_CACHE_TTL) })
    }

    /// Replaces the price cache with an empty one using the given time-to-live. A zero TTL disables caching.
    pub fn with_price_cache_ttl(mut self, ttl: Duration) -> Self {
        self.price_cache = PriceCache::new(ttl);
        self
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn price_cache(&self) -> &PriceCache {
        &self.price_cache
    }
}

impl SettlementDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn process_new_order(&self, order: NewOrder, rules: &SettlementRules) -> Result<SettledOrder, EngineError> {
        let generation = self.price_cache.generation();
        let mut tx = self.pool.begin().await?;
        let user_id = order.user_id;
        let settled = settlement::settle_order(order, rules, &self.price_cache, generation, &mut tx).await.map_err(|e| {
            debug!("🗃️ Settlement for user #{user_id} was rolled back. {e}");
            e
        })?;
        tx.commit().await?;
        info!(
            "🗃️ Order #{} for user #{user_id} settled at {} with {} commission credits",
            settled.order.id,
            settled.order.total_amount,
            settled.commissions.len()
        );
        Ok(settled)
    }

    async fn reprice_order(
        &self,
        order_id: i64,
        new_manual_price: Option<Money>,
        rules: &SettlementRules,
    ) -> Result<PriceAdjustment, EngineError> {
        let mut tx = self.pool.begin().await?;
        let adjustment = settlement::reprice_order(order_id, new_manual_price, rules, &mut tx).await?;
        tx.commit().await?;
        Ok(adjustment)
    }

    async fn update_order_status(
        &self,
        order_id: i64,
        new_status: OrderStatusType,
        changed_by: i64,
    ) -> Result<(Order, Order), EngineError> {
        let mut tx = self.pool.begin().await?;
        let result = settlement::change_status(order_id, new_status, changed_by, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }

    async fn mark_order_paid(&self, order_id: i64) -> Result<OrderPayment, EngineError> {
        let mut tx = self.pool.begin().await?;
        orders::fetch_existing_order(order_id, &mut tx).await?;
        let payment = payments::mark_paid(order_id, &mut tx).await?;
        tx.commit().await?;
        Ok(payment)
    }

    async fn close(&mut self) -> Result<(), EngineError> {
        self.pool.close().await;
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order(order_id, &mut conn).await?)
    }

    async fn fetch_order_details(&self, order_id: i64) -> Result<Option<OrderDetails>, EngineError> {
        let mut tx = self.pool.begin().await?;
        let Some(order) = orders::fetch_order(order_id, &mut tx).await? else {
            return Ok(None);
        };
        let items = orders::fetch_items(order_id, &mut tx).await?;
        let discounts = orders::fetch_discounts(order_id, &mut tx).await?;
        let payment = payments::fetch_payment(order_id, &mut tx).await?;
        let status_history = orders::fetch_status_history(order_id, &mut tx).await?;
        tx.commit().await?;
        Ok(Some(OrderDetails { order, items, discounts, payment, status_history }))
    }

    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_orders_for_user(user_id, &mut conn).await?)
    }

    async fn fetch_price_adjustments(&self, order_id: i64) -> Result<Vec<PriceAdjustmentRecord>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_price_adjustments(order_id, &mut conn).await?)
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn insert_service_type(&self, service_type: NewServiceType) -> Result<ServiceType, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::insert_service_type(service_type, &mut conn).await?)
    }

    async fn insert_service(&self, service: NewService) -> Result<Service, EngineError> {
        let mut tx = self.pool.begin().await?;
        let service = catalog::insert_service(service, &mut tx).await?;
        tx.commit().await?;
        Ok(service)
    }

    async fn insert_article(&self, name: &str) -> Result<Article, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::insert_article(name, &mut conn).await?)
    }

    async fn fetch_article(&self, article_id: i64) -> Result<Option<Article>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::fetch_article(article_id, &mut conn).await?)
    }

    async fn soft_delete_article(&self, article_id: i64) -> Result<Article, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::soft_delete_article(article_id, &mut conn).await?)
    }

    async fn fetch_or_create_price(&self, key: &PriceKey) -> Result<ArticleServicePrice, EngineError> {
        let generation = self.price_cache.generation();
        let mut tx = self.pool.begin().await?;
        let price = settlement::resolve_price(key, &self.price_cache, generation, &mut tx).await?;
        tx.commit().await?;
        Ok(price)
    }

    async fn upsert_price(&self, update: PriceUpdate) -> Result<ArticleServicePrice, EngineError> {
        update.validate().map_err(EngineError::ValidationError)?;
        let key = update.key;
        let mut tx = self.pool.begin().await?;
        let price = catalog::upsert_price(update, &mut tx).await?;
        tx.commit().await?;
        self.price_cache.invalidate(&key);
        Ok(price)
    }

    async fn set_price_availability(&self, key: &PriceKey, is_available: bool) -> Result<ArticleServicePrice, EngineError> {
        let mut conn = self.pool.acquire().await?;
        let price = catalog::set_price_availability(key, is_available, &mut conn).await?;
        self.price_cache.invalidate(key);
        Ok(price)
    }

    async fn insert_offer(&self, offer: NewOffer) -> Result<Offer, EngineError> {
        offer.validate().map_err(EngineError::ValidationError)?;
        let mut tx = self.pool.begin().await?;
        let offer = offers::insert_offer(offer, &mut tx).await?;
        tx.commit().await?;
        Ok(offer)
    }

    async fn fetch_offers(&self, offer_ids: &[i64]) -> Result<Vec<Offer>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(offers::fetch_offers(offer_ids, &mut conn).await?)
    }
}

impl LoyaltyManagement for SqliteDatabase {
    async fn earn_points(&self, entry: PointsEntry) -> Result<LoyaltyAccount, EngineError> {
        let mut tx = self.pool.begin().await?;
        let account = loyalty::earn(&entry, &mut tx).await?;
        tx.commit().await?;
        Ok(account)
    }

    async fn spend_points(&self, entry: PointsEntry) -> Result<LoyaltyAccount, EngineError> {
        let mut tx = self.pool.begin().await?;
        let account = loyalty::spend(&entry, &mut tx).await?;
        tx.commit().await?;
        Ok(account)
    }

    async fn fetch_loyalty_account(&self, user_id: i64) -> Result<Option<LoyaltyAccount>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(loyalty::fetch_account(user_id, &mut conn).await?)
    }

    async fn fetch_point_transactions(&self, user_id: i64) -> Result<Vec<PointTransaction>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(loyalty::fetch_transactions(user_id, &mut conn).await?)
    }
}

impl AffiliateManagement for SqliteDatabase {
    async fn insert_affiliate(&self, affiliate: NewAffiliate) -> Result<AffiliateProfile, EngineError> {
        let mut tx = self.pool.begin().await?;
        let profile = affiliates::insert_affiliate(affiliate, &mut tx).await?;
        tx.commit().await?;
        Ok(profile)
    }

    async fn fetch_affiliate(&self, affiliate_id: i64) -> Result<Option<AffiliateProfile>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(affiliates::fetch_affiliate(affiliate_id, &mut conn).await?)
    }

    async fn fetch_affiliate_by_code(&self, code: &str) -> Result<Option<AffiliateProfile>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(affiliates::fetch_affiliate_by_code(code, &mut conn).await?)
    }

    async fn update_affiliate_status(
        &self,
        affiliate_id: i64,
        status: AffiliateStatus,
    ) -> Result<AffiliateProfile, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(affiliates::update_status(affiliate_id, status, &mut conn).await?)
    }

    async fn assign_parent_affiliate(
        &self,
        affiliate_id: i64,
        parent_id: Option<i64>,
    ) -> Result<AffiliateProfile, EngineError> {
        let mut tx = self.pool.begin().await?;
        let profile = affiliates::assign_parent(affiliate_id, parent_id, &mut tx).await?;
        tx.commit().await?;
        Ok(profile)
    }

    async fn insert_affiliate_level(&self, level: NewAffiliateLevel) -> Result<AffiliateLevel, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(affiliates::insert_level(level, &mut conn).await?)
    }

    async fn fetch_affiliate_levels(&self) -> Result<Vec<AffiliateLevel>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(affiliates::fetch_levels(&mut conn).await?)
    }

    async fn credit_commission(
        &self,
        order_id: i64,
        order_amount: Money,
        code: &str,
        rules: &CommissionRules,
    ) -> Result<Vec<CommissionCredit>, EngineError> {
        let mut tx = self.pool.begin().await?;
        let credits = affiliates::credit_commission_chain(order_id, order_amount, code, rules, &mut tx).await?;
        tx.commit().await?;
        Ok(credits)
    }

    async fn request_withdrawal(&self, affiliate_id: i64, amount: Money) -> Result<CommissionTransaction, EngineError> {
        let mut tx = self.pool.begin().await?;
        let withdrawal = affiliates::insert_withdrawal(affiliate_id, amount, &mut tx).await?;
        tx.commit().await?;
        Ok(withdrawal)
    }

    async fn approve_withdrawal(&self, withdrawal_id: i64) -> Result<CommissionTransaction, EngineError> {
        let mut tx = self.pool.begin().await?;
        let withdrawal =
            affiliates::review_withdrawal(withdrawal_id, CommissionStatus::Approved, None, &mut tx).await?;
        tx.commit().await?;
        Ok(withdrawal)
    }

    async fn reject_withdrawal(&self, withdrawal_id: i64, reason: &str) -> Result<CommissionTransaction, EngineError> {
        let mut tx = self.pool.begin().await?;
        let withdrawal =
            affiliates::review_withdrawal(withdrawal_id, CommissionStatus::Rejected, Some(reason), &mut tx).await?;
        tx.commit().await?;
        Ok(withdrawal)
    }

    async fn fetch_commission_transactions(&self, affiliate_id: i64) -> Result<Vec<CommissionTransaction>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(affiliates::fetch_commission_transactions(affiliate_id, &mut conn).await?)
    }

    async fn link_client(&self, link: NewAffiliateClientLink) -> Result<AffiliateClientLink, EngineError> {
        let mut tx = self.pool.begin().await?;
        let link = affiliates::insert_link(link, &mut tx).await?;
        tx.commit().await?;
        Ok(link)
    }

    async fn fetch_active_link_for_client(
        &self,
        client_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<AffiliateClientLink>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(affiliates::fetch_active_link_for_client(client_id, at, &mut conn).await?)
    }
}
