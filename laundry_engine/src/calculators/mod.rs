//! Store-free settlement arithmetic.
//!
//! Everything in here is deterministic given its inputs. The storage backends load the inputs inside their
//! transactions, call these functions, and persist the outcome.
pub mod commission;
pub mod discounts;
pub mod loyalty;
pub mod pricing;
