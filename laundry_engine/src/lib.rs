//! Laundry Settlement Engine
//!
//! The settlement engine turns a customer's order request into a priced, discounted, stored order, and credits the
//! rewards that hang off it: loyalty points for the customer and referral commission for the affiliate chain. All of
//! that happens in one transaction, so an order either settles completely or leaves no trace.
//!
//! The library is divided into these sections:
//! 1. Storage ([`mod@db`], private). SQLite is the supported backend. The traits it implements are re-exported here so
//!    that other backends (or mocks) can stand in for it. The data types it stores are public in [`mod@db_types`].
//! 2. Settlement arithmetic ([`mod@calculators`]): line pricing, discount stacking, commission rates and loyalty
//!    tiers. These are pure functions.
//! 3. The public API ([`mod@lse_api`]): [`OrderFlowApi`], [`LoyaltyApi`], [`AffiliateApi`] and [`CatalogApi`].
//!
//! The engine also publishes events once a change has committed. Subscribe to them with [`events::EventHooks`] to
//! send notifications or feed an audit trail.
mod db;

pub mod calculators;
pub mod config;
pub mod db_types;
pub mod events;
pub mod lse_api;
pub mod price_cache;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::{run_migrations, SqliteDatabase, SqliteDatabaseError};
pub use db::traits::{AffiliateManagement, CatalogManagement, LoyaltyManagement, OrderManagement, SettlementDatabase};
pub use lse_api::{
    affiliate_api::AffiliateApi,
    affiliate_objects,
    catalog_api::CatalogApi,
    errors::EngineError,
    loyalty_api::LoyaltyApi,
    loyalty_objects,
    order_flow_api::OrderFlowApi,
    order_objects,
};
