use std::collections::HashMap;

use log::*;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{NewOffer, Offer, OfferRow},
    lse_api::errors::EngineError,
};

pub async fn insert_offer(offer: NewOffer, conn: &mut SqliteConnection) -> Result<Offer, SqliteDatabaseError> {
    let row = sqlx::query_as::<_, OfferRow>(
        r#"
            INSERT INTO offers (
                name,
                discount_type,
                discount_value,
                min_purchase_amount,
                max_discount_amount,
                points_required,
                is_cumulative,
                is_active,
                start_date,
                end_date
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *;
        "#,
    )
    .bind(&offer.name)
    .bind(offer.discount.discount_type())
    .bind(offer.discount.stored_value())
    .bind(offer.min_purchase_amount)
    .bind(offer.max_discount_amount)
    .bind(offer.discount.points_required())
    .bind(offer.is_cumulative)
    .bind(offer.is_active)
    .bind(offer.start_date)
    .bind(offer.end_date)
    .fetch_one(&mut *conn)
    .await?;
    for article_id in &offer.eligible_articles {
        sqlx::query("INSERT INTO offer_articles (offer_id, article_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(row.id)
            .bind(article_id)
            .execute(&mut *conn)
            .await?;
    }
    debug!("🗃️ Offer #{} ({}) created", row.id, row.name);
    to_offer(row, offer.eligible_articles)
}

/// Fetches the offers with the given ids, in id order, along with their article restrictions. Unknown ids are
/// ignored.
pub async fn fetch_offers(ids: &[i64], conn: &mut SqliteConnection) -> Result<Vec<Offer>, SqliteDatabaseError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM offers WHERE id IN (");
    let mut list = builder.separated(", ");
    ids.iter().for_each(|id| {
        list.push_bind(*id);
    });
    list.push_unseparated(") ORDER BY id");
    let rows = builder.build_query_as::<OfferRow>().fetch_all(&mut *conn).await?;

    let mut builder = QueryBuilder::<Sqlite>::new("SELECT offer_id, article_id FROM offer_articles WHERE offer_id IN (");
    let mut list = builder.separated(", ");
    ids.iter().for_each(|id| {
        list.push_bind(*id);
    });
    list.push_unseparated(")");
    let restrictions = builder.build_query_as::<(i64, i64)>().fetch_all(&mut *conn).await?;
    let mut eligible = HashMap::<i64, Vec<i64>>::new();
    for (offer_id, article_id) in restrictions {
        eligible.entry(offer_id).or_default().push(article_id);
    }
    trace!("🗃️ Fetched {} of {} requested offers", rows.len(), ids.len());
    rows.into_iter()
        .map(|row| {
            let articles = eligible.remove(&row.id).unwrap_or_default();
            to_offer(row, articles)
        })
        .collect()
}

fn to_offer(row: OfferRow, eligible_articles: Vec<i64>) -> Result<Offer, SqliteDatabaseError> {
    Offer::try_from_row(row, eligible_articles).map_err(|e| EngineError::DatabaseError(e.to_string()).into())
}
