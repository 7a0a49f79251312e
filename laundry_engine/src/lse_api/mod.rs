//! The public face of the engine.
//!
//! Each API struct wraps a storage backend and the event producers. Callers (an HTTP layer, the CLI, tests) construct
//! the APIs they need around the same backend, which is cheap to clone.
pub mod errors;

pub mod affiliate_objects;
pub mod loyalty_objects;
pub mod order_objects;

pub mod affiliate_api;
pub mod catalog_api;
pub mod loyalty_api;
pub mod order_flow_api;
