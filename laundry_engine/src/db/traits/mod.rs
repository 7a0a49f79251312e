//! The storage seams of the engine.
//!
//! A backend implements these traits so that the API structs in `lse_api` can drive it. Every method that mutates
//! more than one row is expected to be atomic: it either commits all of its writes or none of them.
mod affiliate_management;
mod catalog_management;
mod loyalty_management;
mod order_management;
mod settlement_database;

pub use affiliate_management::AffiliateManagement;
pub use catalog_management::CatalogManagement;
pub use loyalty_management::LoyaltyManagement;
pub use order_management::OrderManagement;
pub use settlement_database::SettlementDatabase;
