use anyhow::Result;
use laundry_engine::{
    config::EngineConfig,
    db_types::{Actor, PointSource, PriceKey, PriceUpdate},
    events::EventProducers,
    AffiliateApi,
    CatalogApi,
    LoyaltyApi,
    OrderFlowApi,
    SqliteDatabase,
};
use log::*;

use crate::{
    command_def::{AffiliateCommand, LoyaltyCommand, OrderCommand, PriceCommand, PriceKeyParams, WithdrawalCommand},
    formatting::{
        format_affiliate_summary,
        format_commission_history,
        format_loyalty_summary,
        format_order_details,
        format_orders,
        format_point_history,
        format_price,
        format_price_adjustment,
    },
};

/// The tools publish no events, so subscribers are never notified of changes made here.
struct Engine {
    config: EngineConfig,
    db: SqliteDatabase,
}

impl Engine {
    async fn connect() -> Result<Self> {
        let config = EngineConfig::from_env_or_default();
        let db = SqliteDatabase::new_with_url(&config.database_url, 1).await?.with_price_cache_ttl(config.price_cache_ttl);
        debug!("🛠️ Connected to {}", config.database_url);
        Ok(Self { config, db })
    }

    fn orders(&self) -> OrderFlowApi<SqliteDatabase> {
        OrderFlowApi::new(self.db.clone(), EventProducers::default(), self.config.rules)
    }

    fn loyalty(&self) -> LoyaltyApi<SqliteDatabase> {
        LoyaltyApi::new(self.db.clone(), EventProducers::default())
    }

    fn affiliates(&self) -> AffiliateApi<SqliteDatabase> {
        AffiliateApi::new(
            self.db.clone(),
            EventProducers::default(),
            self.config.rules.commission,
            self.config.min_withdrawal,
        )
    }

    fn catalog(&self) -> CatalogApi<SqliteDatabase> {
        CatalogApi::new(self.db.clone())
    }
}

pub async fn handle_order_command(command: OrderCommand) -> Result<()> {
    let api = Engine::connect().await?.orders();
    match command {
        OrderCommand::Show { id } => {
            let details = api.fetch_order_details(id).await?;
            let adjustments = api.price_adjustments(id).await?;
            println!("{}", format_order_details(&details, &adjustments)?);
        },
        OrderCommand::List { user_id } => {
            let orders = api.orders_for_user(user_id).await?;
            println!("{}", format_orders(&orders));
        },
        OrderCommand::AdjustPrice { id, price } => {
            let adjustment = api.adjust_order_price(id, price).await?;
            println!("{}", format_price_adjustment(&adjustment)?);
        },
        OrderCommand::Status(params) => {
            let actor = Actor::new(params.user_id, params.role);
            let order = api.update_order_status(params.id, params.status, &actor).await?;
            println!("Order #{} is now {}", order.id, order.status);
        },
        OrderCommand::Pay { id } => {
            let payment = api.mark_order_paid(id).await?;
            let paid_at = payment.paid_at.map(|t| t.to_rfc3339()).unwrap_or_default();
            println!("Order #{id} marked as paid at {paid_at}");
        },
    }
    Ok(())
}

pub async fn handle_loyalty_command(command: LoyaltyCommand) -> Result<()> {
    let api = Engine::connect().await?.loyalty();
    match command {
        LoyaltyCommand::Balance { user_id } => {
            let summary = api.summary(user_id).await?;
            println!("{}", format_loyalty_summary(&summary)?);
        },
        LoyaltyCommand::History { user_id } => {
            let history = api.history(user_id).await?;
            println!("{}", format_point_history(&history));
        },
        LoyaltyCommand::Award { user_id, points, reason } => {
            let account = api.earn_points(user_id, points, PointSource::Admin, &reason).await?;
            println!("Awarded {points} points to user #{user_id}. New balance: {}", account.points_balance);
        },
    }
    Ok(())
}

pub async fn handle_affiliate_command(command: AffiliateCommand) -> Result<()> {
    let api = Engine::connect().await?.affiliates();
    match command {
        AffiliateCommand::Show { id } => {
            let summary = api.summary(id).await?;
            println!("{}", format_affiliate_summary(&summary)?);
        },
        AffiliateCommand::Activate { id } => {
            let profile = api.activate(id).await?;
            println!("Affiliate #{id} ({}) is now {}", profile.affiliate_code, profile.status);
        },
        AffiliateCommand::Suspend { id } => {
            let profile = api.suspend(id).await?;
            println!("Affiliate #{id} ({}) is now {}", profile.affiliate_code, profile.status);
        },
        AffiliateCommand::History { id } => {
            let history = api.history(id).await?;
            println!("{}", format_commission_history(&history));
        },
        AffiliateCommand::Withdrawal(WithdrawalCommand::Approve { id }) => {
            let withdrawal = api.approve_withdrawal(id).await?;
            println!("Withdrawal #{id} of {} approved", -withdrawal.amount);
        },
        AffiliateCommand::Withdrawal(WithdrawalCommand::Reject { id, reason }) => {
            let withdrawal = api.reject_withdrawal(id, &reason).await?;
            println!("Withdrawal #{id} rejected. {} returned to affiliate #{}", -withdrawal.amount, withdrawal.affiliate_id);
        },
    }
    Ok(())
}

pub async fn handle_price_command(command: PriceCommand) -> Result<()> {
    let api = Engine::connect().await?.catalog();
    let price = match command {
        PriceCommand::Show(key) => api.price(&price_key(&key)).await?,
        PriceCommand::Item { key, base, premium } => {
            let update = PriceUpdate::per_item(price_key(&key), base, premium.unwrap_or(base));
            api.update_price(update).await?
        },
        PriceCommand::Weight { key, per_kg } => api.update_price(PriceUpdate::per_weight(price_key(&key), per_kg)).await?,
        PriceCommand::Availability { key, available } => api.set_availability(&price_key(&key), available).await?,
    };
    println!("{}", format_price(&price));
    Ok(())
}

fn price_key(params: &PriceKeyParams) -> PriceKey {
    PriceKey::new(params.article, params.service_type, params.service)
}
