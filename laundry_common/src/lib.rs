//! Value types shared between the settlement engine and the operator tooling.
//!
//! Amounts are never floating point. [`Money`] counts minor units (1/100 of a currency unit) and [`Percent`] counts
//! hundredths of a percent, so rate arithmetic is exact up to a single, explicit rounding step.
mod money;
mod percent;

pub mod helpers;
pub mod op;

pub use money::{Money, MoneyConversionError, MINOR_UNITS_PER_UNIT};
pub use percent::{Percent, PercentConversionError};
