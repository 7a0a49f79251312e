use chrono::{DateTime, Utc};
use laundry_common::Money;
use log::*;
use rand::{distributions::Alphanumeric, Rng};
use sqlx::SqliteConnection;

use crate::{
    calculators::commission::{commission_for, creates_cycle, effective_rate},
    config::CommissionRules,
    db::sqlite::SqliteDatabaseError,
    db_types::{
        AffiliateClientLink,
        AffiliateLevel,
        AffiliateProfile,
        AffiliateStatus,
        CommissionStatus,
        CommissionTransaction,
        NewAffiliate,
        NewAffiliateClientLink,
        NewAffiliateLevel,
    },
    lse_api::{affiliate_objects::CommissionCredit, errors::EngineError},
};

const AFFILIATE_CODE_LENGTH: usize = 10;
const MAX_CODE_ATTEMPTS: usize = 5;

pub fn generate_affiliate_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(AFFILIATE_CODE_LENGTH)
        .map(char::from)
        .collect::<String>()
        .to_uppercase()
}

pub async fn fetch_affiliate(id: i64, conn: &mut SqliteConnection) -> Result<Option<AffiliateProfile>, SqliteDatabaseError> {
    let result = sqlx::query_as::<_, AffiliateProfile>("SELECT * FROM affiliate_profiles WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(result)
}

pub async fn fetch_existing_affiliate(id: i64, conn: &mut SqliteConnection) -> Result<AffiliateProfile, SqliteDatabaseError> {
    fetch_affiliate(id, conn).await?.ok_or_else(|| EngineError::not_found(format!("Affiliate #{id}")).into())
}

pub async fn fetch_affiliate_by_code(
    code: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<AffiliateProfile>, SqliteDatabaseError> {
    let result = sqlx::query_as::<_, AffiliateProfile>("SELECT * FROM affiliate_profiles WHERE affiliate_code = $1")
        .bind(code)
        .fetch_optional(conn)
        .await?;
    Ok(result)
}

pub async fn fetch_affiliate_by_user(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<AffiliateProfile>, SqliteDatabaseError> {
    let result = sqlx::query_as::<_, AffiliateProfile>("SELECT * FROM affiliate_profiles WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(result)
}

/// Registers a pending affiliate. Code collisions are retried with a fresh code a few times before giving up.
pub async fn insert_affiliate(
    affiliate: NewAffiliate,
    conn: &mut SqliteConnection,
) -> Result<AffiliateProfile, SqliteDatabaseError> {
    if fetch_affiliate_by_user(affiliate.user_id, conn).await?.is_some() {
        return Err(EngineError::invalid(format!("User #{} is already an affiliate", affiliate.user_id)).into());
    }
    let parent_id = match &affiliate.parent_code {
        Some(code) => {
            let parent = fetch_affiliate_by_code(code, conn)
                .await?
                .ok_or_else(|| EngineError::not_found(format!("Affiliate with code {code}")))?;
            Some(parent.id)
        },
        None => None,
    };
    for _ in 0..MAX_CODE_ATTEMPTS {
        let code = generate_affiliate_code();
        let result = sqlx::query_as::<_, AffiliateProfile>(
            r#"
                INSERT INTO affiliate_profiles (user_id, affiliate_code, parent_affiliate_id)
                VALUES ($1, $2, $3)
                RETURNING *;
            "#,
        )
        .bind(affiliate.user_id)
        .bind(&code)
        .bind(parent_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(SqliteDatabaseError::from);
        match result {
            Ok(profile) => {
                info!("💸️ User #{} registered as affiliate #{} with code {code}", profile.user_id, profile.id);
                return Ok(profile);
            },
            Err(e) if e.is_unique_violation() => warn!("💸️ Affiliate code {code} is taken. Trying another."),
            Err(e) => return Err(e),
        }
    }
    Err(SqliteDatabaseError::QueryError(format!(
        "Could not generate a unique affiliate code after {MAX_CODE_ATTEMPTS} attempts"
    )))
}

pub async fn update_status(
    id: i64,
    status: AffiliateStatus,
    conn: &mut SqliteConnection,
) -> Result<AffiliateProfile, SqliteDatabaseError> {
    let is_active = status == AffiliateStatus::Active;
    let result = sqlx::query_as::<_, AffiliateProfile>(
        r#"
            UPDATE affiliate_profiles SET status = $1, is_active = $2, updated_at = CURRENT_TIMESTAMP
            WHERE id = $3
            RETURNING *;
        "#,
    )
    .bind(status)
    .bind(is_active)
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| EngineError::not_found(format!("Affiliate #{id}")))?;
    info!("💸️ Affiliate #{id} is now {status}");
    Ok(result)
}

/// The ancestors of `id`, nearest first. The walk stops if it ever revisits an affiliate, so corrupt data cannot make
/// it loop.
pub async fn parent_chain(id: i64, conn: &mut SqliteConnection) -> Result<Vec<i64>, SqliteDatabaseError> {
    let mut chain = Vec::new();
    let mut current = fetch_existing_affiliate(id, conn).await?.parent_affiliate_id;
    while let Some(parent_id) = current {
        if parent_id == id || chain.contains(&parent_id) {
            warn!("💸️ The parent chain of affiliate #{id} loops back on itself at #{parent_id}");
            break;
        }
        chain.push(parent_id);
        current = fetch_affiliate(parent_id, conn).await?.and_then(|p| p.parent_affiliate_id);
    }
    Ok(chain)
}

pub async fn assign_parent(
    id: i64,
    parent_id: Option<i64>,
    conn: &mut SqliteConnection,
) -> Result<AffiliateProfile, SqliteDatabaseError> {
    fetch_existing_affiliate(id, conn).await?;
    if let Some(parent_id) = parent_id {
        fetch_existing_affiliate(parent_id, conn).await?;
        let ancestors = parent_chain(parent_id, conn).await?;
        if creates_cycle(id, parent_id, &ancestors) {
            return Err(EngineError::invalid(format!(
                "Affiliate #{parent_id} cannot be the parent of #{id}: it would make #{id} its own ancestor"
            ))
            .into());
        }
    }
    let result = sqlx::query_as::<_, AffiliateProfile>(
        r#"
            UPDATE affiliate_profiles SET parent_affiliate_id = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2
            RETURNING *;
        "#,
    )
    .bind(parent_id)
    .bind(id)
    .fetch_one(conn)
    .await?;
    debug!("💸️ Affiliate #{id} now has parent {parent_id:?}");
    Ok(result)
}

pub async fn insert_level(level: NewAffiliateLevel, conn: &mut SqliteConnection) -> Result<AffiliateLevel, SqliteDatabaseError> {
    let result = sqlx::query_as::<_, AffiliateLevel>(
        r#"
            INSERT INTO affiliate_levels (name, min_referrals, commission_rate) VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(&level.name)
    .bind(level.min_referrals)
    .bind(level.commission_rate)
    .fetch_one(conn)
    .await?;
    Ok(result)
}

pub async fn fetch_levels(conn: &mut SqliteConnection) -> Result<Vec<AffiliateLevel>, SqliteDatabaseError> {
    let result =
        sqlx::query_as::<_, AffiliateLevel>("SELECT * FROM affiliate_levels ORDER BY min_referrals").fetch_all(conn).await?;
    Ok(result)
}

/// Adds a signed `amount` to the affiliate's balance and earnings and appends a `CREDITED` ledger row.
pub async fn credit(
    affiliate_id: i64,
    order_id: i64,
    amount: Money,
    notes: &str,
    conn: &mut SqliteConnection,
) -> Result<CommissionTransaction, SqliteDatabaseError> {
    sqlx::query(
        r#"
            UPDATE affiliate_profiles SET
                commission_balance = commission_balance + $1,
                total_earned = total_earned + $1,
                monthly_earnings = monthly_earnings + $1,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $2;
        "#,
    )
    .bind(amount)
    .bind(affiliate_id)
    .execute(&mut *conn)
    .await?;
    let result = sqlx::query_as::<_, CommissionTransaction>(
        r#"
            INSERT INTO commission_transactions (affiliate_id, order_id, amount, status, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(affiliate_id)
    .bind(order_id)
    .bind(amount)
    .bind(CommissionStatus::Credited)
    .bind(notes)
    .fetch_one(conn)
    .await?;
    Ok(result)
}

async fn increment_referrals(affiliate_id: i64, conn: &mut SqliteConnection) -> Result<(), SqliteDatabaseError> {
    sqlx::query("UPDATE affiliate_profiles SET total_referrals = total_referrals + 1 WHERE id = $1")
        .bind(affiliate_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Credits commission on `order_amount` to the affiliate owning `code`, then walks up its parent chain.
///
/// The direct affiliate must exist and be eligible. Its rate comes from the level table, and it gains one referral.
/// Each ancestor receives `rules.parent_rate` of the share credited one generation below it, for at most
/// `rules.max_parent_levels` generations. Ineligible ancestors are skipped but still count as a generation. The walk
/// ends early when a share rounds to zero. This is not atomic; call it inside a transaction.
pub async fn credit_commission_chain(
    order_id: i64,
    order_amount: Money,
    code: &str,
    rules: &CommissionRules,
    conn: &mut SqliteConnection,
) -> Result<Vec<CommissionCredit>, SqliteDatabaseError> {
    let affiliate = fetch_affiliate_by_code(code, conn)
        .await?
        .ok_or_else(|| EngineError::not_found(format!("Affiliate with code {code}")))?;
    if !affiliate.is_eligible() {
        return Err(EngineError::InactiveResource(format!("Affiliate {code}")).into());
    }
    let levels = fetch_levels(conn).await?;
    let rate = effective_rate(&levels, affiliate.total_referrals, rules.default_rate);
    let amount = commission_for(order_amount, rate);
    let notes = format!("Commission at {rate} on order #{order_id}");
    let tx = credit(affiliate.id, order_id, amount, &notes, conn).await?;
    increment_referrals(affiliate.id, conn).await?;
    debug!("💸️ Affiliate {code} earned {amount} ({rate}) on order #{order_id}");
    let mut credits = vec![CommissionCredit {
        affiliate_id: affiliate.id,
        user_id: affiliate.user_id,
        affiliate_code: affiliate.affiliate_code.clone(),
        depth: 0,
        amount,
        transaction_id: tx.id,
    }];

    let mut share = amount;
    let mut visited = vec![affiliate.id];
    let mut next_parent = affiliate.parent_affiliate_id;
    for depth in 1..=rules.max_parent_levels {
        let Some(parent_id) = next_parent else { break };
        if visited.contains(&parent_id) {
            warn!("💸️ Affiliate #{parent_id} appears twice in the parent chain of {code}. Stopping the fan-out.");
            break;
        }
        visited.push(parent_id);
        let Some(parent) = fetch_affiliate(parent_id, conn).await? else {
            warn!("💸️ Parent affiliate #{parent_id} does not exist. Stopping the fan-out.");
            break;
        };
        next_parent = parent.parent_affiliate_id;
        share = rules.parent_rate.of(share);
        if share.is_zero() {
            trace!("💸️ The parent share rounds to zero at depth {depth}. Stopping the fan-out.");
            break;
        }
        if !parent.is_eligible() {
            debug!("💸️ Skipping inactive ancestor #{parent_id} at depth {depth}");
            continue;
        }
        let notes = format!("Level {depth} parent commission on order #{order_id}");
        let tx = credit(parent.id, order_id, share, &notes, conn).await?;
        debug!("💸️ Ancestor #{} earned {share} at depth {depth} on order #{order_id}", parent.id);
        credits.push(CommissionCredit {
            affiliate_id: parent.id,
            user_id: parent.user_id,
            affiliate_code: parent.affiliate_code,
            depth,
            amount: share,
            transaction_id: tx.id,
        });
    }
    Ok(credits)
}

/// Takes `amount` off the commission balance and records a pending withdrawal. The balance is only decremented while
/// it covers the amount.
pub async fn insert_withdrawal(
    affiliate_id: i64,
    amount: Money,
    conn: &mut SqliteConnection,
) -> Result<CommissionTransaction, SqliteDatabaseError> {
    let affiliate = fetch_existing_affiliate(affiliate_id, conn).await?;
    if !affiliate.is_eligible() {
        return Err(EngineError::InactiveResource(format!("Affiliate #{affiliate_id}")).into());
    }
    let updated = sqlx::query(
        r#"
            UPDATE affiliate_profiles SET
                commission_balance = commission_balance - $1,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND commission_balance >= $1;
        "#,
    )
    .bind(amount)
    .bind(affiliate_id)
    .execute(&mut *conn)
    .await?;
    if updated.rows_affected() == 0 {
        return Err(EngineError::InsufficientCommission { available: affiliate.commission_balance, requested: amount }.into());
    }
    let result = sqlx::query_as::<_, CommissionTransaction>(
        r#"
            INSERT INTO commission_transactions (affiliate_id, order_id, amount, status, notes)
            VALUES ($1, NULL, $2, $3, 'Withdrawal request')
            RETURNING *;
        "#,
    )
    .bind(affiliate_id)
    .bind(-amount)
    .bind(CommissionStatus::Pending)
    .fetch_one(conn)
    .await?;
    info!("💸️ Affiliate #{affiliate_id} requested a withdrawal of {amount} (#{})", result.id);
    Ok(result)
}

pub async fn fetch_commission_transaction(
    id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<CommissionTransaction>, SqliteDatabaseError> {
    let result = sqlx::query_as::<_, CommissionTransaction>("SELECT * FROM commission_transactions WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(result)
}

/// Moves a pending withdrawal to `APPROVED` or `REJECTED`. A rejected withdrawal is refunded to the balance.
pub async fn review_withdrawal(
    id: i64,
    new_status: CommissionStatus,
    notes: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<CommissionTransaction, SqliteDatabaseError> {
    let withdrawal = fetch_commission_transaction(id, conn)
        .await?
        .filter(|t| t.is_withdrawal())
        .ok_or_else(|| EngineError::not_found(format!("Withdrawal #{id}")))?;
    let result = sqlx::query_as::<_, CommissionTransaction>(
        r#"
            UPDATE commission_transactions SET
                status = $1,
                notes = COALESCE($2, notes),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $3 AND status = $4
            RETURNING *;
        "#,
    )
    .bind(new_status)
    .bind(notes)
    .bind(id)
    .bind(CommissionStatus::Pending)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| EngineError::InvalidTransition { from: withdrawal.status.to_string(), to: new_status.to_string() })?;
    if new_status == CommissionStatus::Rejected {
        // Withdrawals are stored negative, so the refund is the negated amount
        sqlx::query(
            r#"
                UPDATE affiliate_profiles SET
                    commission_balance = commission_balance + $1,
                    updated_at = CURRENT_TIMESTAMP
                WHERE id = $2;
            "#,
        )
        .bind(-result.amount)
        .bind(result.affiliate_id)
        .execute(conn)
        .await?;
    }
    info!("💸️ Withdrawal #{id} for affiliate #{} is now {new_status}", result.affiliate_id);
    Ok(result)
}

pub async fn fetch_commission_transactions(
    affiliate_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<CommissionTransaction>, SqliteDatabaseError> {
    let result =
        sqlx::query_as::<_, CommissionTransaction>("SELECT * FROM commission_transactions WHERE affiliate_id = $1 ORDER BY id")
            .bind(affiliate_id)
            .fetch_all(conn)
            .await?;
    Ok(result)
}

pub async fn insert_link(
    link: NewAffiliateClientLink,
    conn: &mut SqliteConnection,
) -> Result<AffiliateClientLink, SqliteDatabaseError> {
    if let Some(end) = link.end_date {
        if end < link.start_date {
            return Err(EngineError::invalid("A client link cannot end before it starts").into());
        }
    }
    fetch_existing_affiliate(link.affiliate_id, conn).await?;
    let result = sqlx::query_as::<_, AffiliateClientLink>(
        r#"
            INSERT INTO affiliate_client_links (affiliate_id, client_id, start_date, end_date)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(link.affiliate_id)
    .bind(link.client_id)
    .bind(link.start_date)
    .bind(link.end_date)
    .fetch_one(conn)
    .await?;
    debug!("💸️ Client #{} linked to affiliate #{}", result.client_id, result.affiliate_id);
    Ok(result)
}

pub async fn link_exists(affiliate_id: i64, client_id: i64, conn: &mut SqliteConnection) -> Result<bool, SqliteDatabaseError> {
    let found = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM affiliate_client_links WHERE affiliate_id = $1 AND client_id = $2 LIMIT 1",
    )
    .bind(affiliate_id)
    .bind(client_id)
    .fetch_optional(conn)
    .await?;
    Ok(found.is_some())
}

/// The most recently started link in force at `at` whose affiliate is eligible.
///
/// Stored dates may use different text formats, so the window is checked after decoding rather than in SQL.
pub async fn fetch_active_link_for_client(
    client_id: i64,
    at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<AffiliateClientLink>, SqliteDatabaseError> {
    let mut links = sqlx::query_as::<_, AffiliateClientLink>("SELECT * FROM affiliate_client_links WHERE client_id = $1")
        .bind(client_id)
        .fetch_all(&mut *conn)
        .await?;
    links.retain(|l| l.is_active_at(at));
    links.sort_by(|a, b| b.start_date.cmp(&a.start_date).then(b.id.cmp(&a.id)));
    for link in links {
        match fetch_affiliate(link.affiliate_id, conn).await? {
            Some(a) if a.is_eligible() => return Ok(Some(link)),
            _ => trace!("💸️ Ignoring link #{} to an inactive affiliate", link.id),
        }
    }
    Ok(None)
}
