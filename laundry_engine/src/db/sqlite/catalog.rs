use log::*;
use sqlx::SqliteConnection;

use crate::{
    calculators::pricing::PLACEHOLDER_PRICE,
    db::sqlite::SqliteDatabaseError,
    db_types::{
        Article,
        ArticleServicePrice,
        NewService,
        NewServiceType,
        PriceKey,
        PriceUpdate,
        PricingType,
        Service,
        ServiceType,
    },
    lse_api::errors::EngineError,
};

pub async fn insert_service_type(
    service_type: NewServiceType,
    conn: &mut SqliteConnection,
) -> Result<ServiceType, SqliteDatabaseError> {
    let result = sqlx::query_as::<_, ServiceType>(
        r#"INSERT INTO service_types (name, default_pricing_type) VALUES ($1, $2) RETURNING *;"#,
    )
    .bind(service_type.name)
    .bind(service_type.default_pricing_type)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Service type #{} ({}) created", result.id, result.name);
    Ok(result)
}

pub async fn fetch_service_type(id: i64, conn: &mut SqliteConnection) -> Result<Option<ServiceType>, SqliteDatabaseError> {
    let result = sqlx::query_as::<_, ServiceType>("SELECT * FROM service_types WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(result)
}

pub async fn insert_service(service: NewService, conn: &mut SqliteConnection) -> Result<Service, SqliteDatabaseError> {
    if fetch_service_type(service.service_type_id, conn).await?.is_none() {
        return Err(EngineError::not_found(format!("Service type #{}", service.service_type_id)).into());
    }
    let result = sqlx::query_as::<_, Service>(
        r#"INSERT INTO services (name, service_type_id) VALUES ($1, $2) RETURNING *;"#,
    )
    .bind(service.name)
    .bind(service.service_type_id)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Service #{} ({}) created", result.id, result.name);
    Ok(result)
}

pub async fn insert_article(name: &str, conn: &mut SqliteConnection) -> Result<Article, SqliteDatabaseError> {
    let result = sqlx::query_as::<_, Article>(r#"INSERT INTO articles (name) VALUES ($1) RETURNING *;"#)
        .bind(name)
        .fetch_one(conn)
        .await?;
    debug!("🗃️ Article #{} ({}) created", result.id, result.name);
    Ok(result)
}

pub async fn fetch_article(id: i64, conn: &mut SqliteConnection) -> Result<Option<Article>, SqliteDatabaseError> {
    let result =
        sqlx::query_as::<_, Article>("SELECT * FROM articles WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(result)
}

/// Fetches the article and fails unless it exists and has not been deleted.
pub async fn fetch_live_article(id: i64, conn: &mut SqliteConnection) -> Result<Article, SqliteDatabaseError> {
    match fetch_article(id, conn).await? {
        Some(a) if !a.is_deleted => Ok(a),
        Some(_) => Err(EngineError::not_found(format!("Article #{id} (deleted)")).into()),
        None => Err(EngineError::not_found(format!("Article #{id}")).into()),
    }
}

pub async fn soft_delete_article(id: i64, conn: &mut SqliteConnection) -> Result<Article, SqliteDatabaseError> {
    let result = sqlx::query_as::<_, Article>(
        r#"UPDATE articles SET is_deleted = 1, updated_at = CURRENT_TIMESTAMP WHERE id = $1 RETURNING *;"#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| EngineError::not_found(format!("Article #{id}")))?;
    info!("🗃️ Article #{id} has been deleted");
    Ok(result)
}

pub async fn fetch_price(key: &PriceKey, conn: &mut SqliteConnection) -> Result<Option<ArticleServicePrice>, SqliteDatabaseError> {
    let result = sqlx::query_as::<_, ArticleServicePrice>(
        r#"
            SELECT * FROM article_service_prices
            WHERE article_id = $1 AND service_type_id = $2 AND service_id = $3
        "#,
    )
    .bind(key.article_id)
    .bind(key.service_type_id)
    .bind(key.service_id)
    .fetch_optional(conn)
    .await?;
    Ok(result)
}

/// Creates the placeholder row for a triple that has no price yet. The pricing type comes from the service type, and
/// per-weight placeholders charge the placeholder price per kilogram.
pub async fn insert_placeholder_price(
    key: &PriceKey,
    conn: &mut SqliteConnection,
) -> Result<ArticleServicePrice, SqliteDatabaseError> {
    let service_type = fetch_service_type(key.service_type_id, conn)
        .await?
        .ok_or_else(|| EngineError::not_found(format!("Service type #{}", key.service_type_id)))?;
    ensure_service_exists(key.service_id, conn).await?;
    let price_per_kg = (service_type.default_pricing_type == PricingType::PerWeight).then_some(PLACEHOLDER_PRICE);
    let result = sqlx::query_as::<_, ArticleServicePrice>(
        r#"
            INSERT INTO article_service_prices
                (article_id, service_type_id, service_id, base_price, premium_price, price_per_kg, pricing_type)
            VALUES ($1, $2, $3, $4, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(key.article_id)
    .bind(key.service_type_id)
    .bind(key.service_id)
    .bind(PLACEHOLDER_PRICE)
    .bind(price_per_kg)
    .bind(service_type.default_pricing_type)
    .fetch_one(conn)
    .await?;
    warn!(
        "🗃️ No {key} was configured. A {} placeholder of {PLACEHOLDER_PRICE} has been created. Please configure the \
         catalog.",
        service_type.default_pricing_type
    );
    Ok(result)
}

/// Returns the price row for the triple and whether it was just created.
pub async fn fetch_or_create_price(
    key: &PriceKey,
    conn: &mut SqliteConnection,
) -> Result<(ArticleServicePrice, bool), SqliteDatabaseError> {
    match fetch_price(key, conn).await? {
        Some(price) => Ok((price, false)),
        None => insert_placeholder_price(key, conn).await.map(|p| (p, true)),
    }
}

pub async fn upsert_price(update: PriceUpdate, conn: &mut SqliteConnection) -> Result<ArticleServicePrice, SqliteDatabaseError> {
    fetch_article(update.key.article_id, conn)
        .await?
        .ok_or_else(|| EngineError::not_found(format!("Article #{}", update.key.article_id)))?;
    fetch_service_type(update.key.service_type_id, conn)
        .await?
        .ok_or_else(|| EngineError::not_found(format!("Service type #{}", update.key.service_type_id)))?;
    ensure_service_exists(update.key.service_id, conn).await?;
    let result = sqlx::query_as::<_, ArticleServicePrice>(
        r#"
            INSERT INTO article_service_prices
                (article_id, service_type_id, service_id, base_price, premium_price, price_per_kg, pricing_type, is_available)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (article_id, service_type_id, service_id) DO UPDATE SET
                base_price = excluded.base_price,
                premium_price = excluded.premium_price,
                price_per_kg = excluded.price_per_kg,
                pricing_type = excluded.pricing_type,
                is_available = excluded.is_available,
                updated_at = CURRENT_TIMESTAMP
            RETURNING *;
        "#,
    )
    .bind(update.key.article_id)
    .bind(update.key.service_type_id)
    .bind(update.key.service_id)
    .bind(update.base_price)
    .bind(update.premium_price)
    .bind(update.price_per_kg)
    .bind(update.pricing_type)
    .bind(update.is_available)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ The {} is now {} ({})", update.key, result.base_price, result.pricing_type);
    Ok(result)
}

pub async fn set_price_availability(
    key: &PriceKey,
    is_available: bool,
    conn: &mut SqliteConnection,
) -> Result<ArticleServicePrice, SqliteDatabaseError> {
    let result = sqlx::query_as::<_, ArticleServicePrice>(
        r#"
            UPDATE article_service_prices SET is_available = $1, updated_at = CURRENT_TIMESTAMP
            WHERE article_id = $2 AND service_type_id = $3 AND service_id = $4
            RETURNING *;
        "#,
    )
    .bind(is_available)
    .bind(key.article_id)
    .bind(key.service_type_id)
    .bind(key.service_id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| EngineError::not_found(key.to_string()))?;
    Ok(result)
}

async fn ensure_service_exists(id: i64, conn: &mut SqliteConnection) -> Result<(), SqliteDatabaseError> {
    let exists = sqlx::query_scalar::<_, i64>("SELECT id FROM services WHERE id = $1").bind(id).fetch_optional(conn).await?;
    match exists {
        Some(_) => Ok(()),
        None => Err(EngineError::not_found(format!("Service #{id}")).into()),
    }
}

