//! Engine configuration, read from `LDY_*` environment variables.
//!
//! Every setting has a default, and falling back to it is logged. Binaries should call `dotenvy::dotenv()` before
//! [`EngineConfig::from_env_or_default`] so that a `.env` file is honoured.
use std::{fmt::Display, str::FromStr, time::Duration};

use laundry_common::{
    helpers::{env_value, EnvValueError},
    Money,
    Percent,
};
use log::*;

use crate::calculators::commission::{DEFAULT_COMMISSION_RATE, DEFAULT_MAX_PARENT_LEVELS, DEFAULT_PARENT_COMMISSION_RATE};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/laundry.db";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 25;
pub const DEFAULT_ORDER_POINTS_MULTIPLIER: f64 = 1.0;
pub const DEFAULT_MIN_WITHDRAWAL: Money = Money::from_units(5000);
pub const DEFAULT_PRICE_CACHE_TTL: Duration = Duration::from_secs(300);
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 25;

/// How commission is computed and propagated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommissionRules {
    /// Used when no affiliate level matches
    pub default_rate: Percent,
    /// Share of the child's commission credited to each ancestor
    pub parent_rate: Percent,
    /// Number of ancestor generations that receive a share
    pub max_parent_levels: usize,
}

impl Default for CommissionRules {
    fn default() -> Self {
        Self {
            default_rate: DEFAULT_COMMISSION_RATE,
            parent_rate: DEFAULT_PARENT_COMMISSION_RATE,
            max_parent_levels: DEFAULT_MAX_PARENT_LEVELS,
        }
    }
}

/// The knobs that settlement and price adjustment need. Passed explicitly to the storage backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettlementRules {
    /// Loyalty points per currency unit of an order's final amount
    pub order_points_multiplier: f64,
    /// Loyalty points per currency unit of a price adjustment
    pub adjustment_points_multiplier: f64,
    pub commission: CommissionRules,
}

impl Default for SettlementRules {
    fn default() -> Self {
        Self {
            order_points_multiplier: DEFAULT_ORDER_POINTS_MULTIPLIER,
            adjustment_points_multiplier: DEFAULT_ORDER_POINTS_MULTIPLIER,
            commission: CommissionRules::default(),
        }
    }
}

impl SettlementRules {
    pub fn with_points_multiplier(mut self, multiplier: f64) -> Self {
        self.order_points_multiplier = multiplier;
        self.adjustment_points_multiplier = multiplier;
        self
    }

    pub fn with_max_parent_levels(mut self, levels: usize) -> Self {
        self.commission.max_parent_levels = levels;
        self
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub rules: SettlementRules,
    /// Smallest commission withdrawal an affiliate may request
    pub min_withdrawal: Money,
    pub price_cache_ttl: Duration,
    pub event_buffer_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            rules: SettlementRules::default(),
            min_withdrawal: DEFAULT_MIN_WITHDRAWAL,
            price_cache_ttl: DEFAULT_PRICE_CACHE_TTL,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
        }
    }
}

impl EngineConfig {
    pub fn from_env_or_default() -> Self {
        let database_url = env_or("LDY_DATABASE_URL", DEFAULT_DATABASE_URL.to_string());
        let max_connections = env_or("LDY_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS);
        let order_points_multiplier = env_or("LDY_ORDER_POINTS_MULTIPLIER", DEFAULT_ORDER_POINTS_MULTIPLIER);
        let adjustment_points_multiplier = env_or("LDY_ADJUSTMENT_POINTS_MULTIPLIER", order_points_multiplier);
        let default_rate = env_or("LDY_DEFAULT_COMMISSION_RATE", DEFAULT_COMMISSION_RATE);
        let parent_rate = env_or("LDY_PARENT_COMMISSION_RATE", DEFAULT_PARENT_COMMISSION_RATE);
        let max_parent_levels = env_or("LDY_MAX_COMMISSION_LEVELS", DEFAULT_MAX_PARENT_LEVELS);
        let min_withdrawal = env_or("LDY_MIN_WITHDRAWAL", DEFAULT_MIN_WITHDRAWAL);
        let price_cache_ttl = Duration::from_secs(env_or("LDY_PRICE_CACHE_TTL_SECS", DEFAULT_PRICE_CACHE_TTL.as_secs()));
        let event_buffer_size = env_or("LDY_EVENT_BUFFER_SIZE", DEFAULT_EVENT_BUFFER_SIZE);
        let rules = SettlementRules {
            order_points_multiplier,
            adjustment_points_multiplier,
            commission: CommissionRules { default_rate, parent_rate, max_parent_levels },
        };
        Self { database_url, max_connections, rules, min_withdrawal, price_cache_ttl, event_buffer_size }
    }
}

fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env_value::<T>(key) {
        Ok(v) => v,
        Err(EnvValueError::Missing) => {
            info!("🪛️ {key} is not set. Using the default, {default}.");
            default
        },
        Err(EnvValueError::Invalid(e)) => {
            error!("🪛️ {e} Using the default, {default}, instead.");
            default
        },
    }
}
