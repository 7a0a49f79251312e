use laundry_common::Money;
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{ArticleServicePrice, PricingType, StoredPricingType},
    lse_api::errors::EngineError,
};

/// The price given to auto-provisioned rows and to lines that could not be priced properly.
pub const PLACEHOLDER_PRICE: Money = Money::from_units(1);

/// The priced result for one order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinePrice {
    pub unit_price: Money,
    pub line_total: Money,
    pub pricing_type: StoredPricingType,
    /// True when the price did not come from a usable configuration (unknown pricing type or a non-positive price)
    pub degraded: bool,
}

/// Prices one line from its price row.
///
/// * `PER_WEIGHT` needs a positive weight and a configured `price_per_kg`, otherwise it fails with
///   [`EngineError::MissingConfiguration`]. The line total is `price_per_kg × weight`.
/// * `PER_ITEM` and `FIXED` use the premium or base price, times quantity.
/// * An unrecognised pricing type takes the degraded branch: the placeholder unit price, times quantity.
///
/// A resolved unit price of zero or less is replaced by the placeholder and the line total recomputed.
/// A line total that cannot be represented is a [`EngineError::ValidationError`].
pub fn price_line(
    price: &ArticleServicePrice,
    quantity: i64,
    weight: Option<f64>,
    is_premium: bool,
) -> Result<LinePrice, EngineError> {
    if !price.is_available {
        return Err(EngineError::InactiveResource(price.key().to_string()));
    }
    if quantity <= 0 {
        return Err(EngineError::invalid(format!("Quantity must be positive, got {quantity}")));
    }
    let (unit_price, weight, mut degraded) = match &price.pricing_type {
        StoredPricingType::Recognised(PricingType::PerWeight) => {
            let weight = weight.filter(|w| w.is_finite() && *w > 0.0).ok_or_else(|| {
                EngineError::MissingConfiguration(format!("a positive weight is required for the {}", price.key()))
            })?;
            let per_kg = price
                .price_per_kg
                .ok_or_else(|| EngineError::MissingConfiguration(format!("no price per kg is set on the {}", price.key())))?;
            (per_kg, Some(weight), false)
        },
        StoredPricingType::Recognised(PricingType::PerItem | PricingType::Fixed) => {
            let unit = if is_premium { price.premium_price } else { price.base_price };
            (unit, None, false)
        },
        StoredPricingType::Unrecognised(raw) => {
            warn!("🧮️ Degraded pricing: unrecognised pricing type '{raw}' on the {}. Using the placeholder price.", price.key());
            (PLACEHOLDER_PRICE, None, true)
        },
    };
    let unit_price = if unit_price.is_positive() {
        unit_price
    } else {
        warn!("🧮️ The {} resolved to {unit_price}. Using the placeholder price instead.", price.key());
        degraded = true;
        PLACEHOLDER_PRICE
    };
    let line_total = match weight {
        Some(kg) => unit_price.times_weight(kg),
        None => unit_price.checked_mul(quantity),
    }
    .ok_or_else(|| EngineError::invalid(format!("The line total for the {} is too large", price.key())))?;
    Ok(LinePrice { unit_price, line_total, pricing_type: price.pricing_type.clone(), degraded })
}
