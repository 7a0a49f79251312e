use std::{collections::HashSet, fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use laundry_common::{Money, Percent};
use log::*;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(String);

//--------------------------------------     PricingType      ---------------------------------------------------------
/// How a line price is computed from a price row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PricingType {
    /// `base_price` or `premium_price` per unit of quantity
    PerItem,
    /// `price_per_kg` per kilogram of weight
    PerWeight,
    /// Like `PerItem`, but the price does not vary with the service options
    Fixed,
}

impl PricingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PricingType::PerItem => "PER_ITEM",
            PricingType::PerWeight => "PER_WEIGHT",
            PricingType::Fixed => "FIXED",
        }
    }
}

impl Display for PricingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PricingType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PER_ITEM" => Ok(Self::PerItem),
            "PER_WEIGHT" => Ok(Self::PerWeight),
            "FIXED" => Ok(Self::Fixed),
            s => Err(ConversionError(format!("Unknown pricing type: {s}"))),
        }
    }
}

/// The pricing type found on a stored price row.
///
/// Rows written by other tools can carry values the engine does not know. Those are kept verbatim so that the pricing
/// engine can take its explicit degraded branch instead of failing to load the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoredPricingType {
    Recognised(PricingType),
    Unrecognised(String),
}

impl From<String> for StoredPricingType {
    fn from(value: String) -> Self {
        match value.parse::<PricingType>() {
            Ok(t) => Self::Recognised(t),
            Err(_) => {
                warn!("🧮️ Price row carries an unrecognised pricing type: {value}");
                Self::Unrecognised(value)
            },
        }
    }
}

impl From<PricingType> for StoredPricingType {
    fn from(value: PricingType) -> Self {
        Self::Recognised(value)
    }
}

impl Display for StoredPricingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Recognised(t) => write!(f, "{t}"),
            Self::Unrecognised(s) => f.write_str(s),
        }
    }
}

//--------------------------------------       Catalog        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ServiceType {
    pub id: i64,
    pub name: String,
    pub default_pricing_type: PricingType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewServiceType {
    pub name: String,
    pub default_pricing_type: PricingType,
}

impl NewServiceType {
    pub fn new<S: Into<String>>(name: S, default_pricing_type: PricingType) -> Self {
        Self { name: name.into(), default_pricing_type }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub service_type_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewService {
    pub name: String,
    pub service_type_id: i64,
}

impl NewService {
    pub fn new<S: Into<String>>(name: S, service_type_id: i64) -> Self {
        Self { name: name.into(), service_type_id }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub name: String,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------       PriceKey       ---------------------------------------------------------
/// The only valid lookup key for a price row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceKey {
    pub article_id: i64,
    pub service_type_id: i64,
    pub service_id: i64,
}

impl PriceKey {
    pub fn new(article_id: i64, service_type_id: i64, service_id: i64) -> Self {
        Self { article_id, service_type_id, service_id }
    }
}

impl Display for PriceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "price for article #{}, service type #{}, service #{}", self.article_id, self.service_type_id, self.service_id)
    }
}

//--------------------------------------  ArticleServicePrice  --------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleServicePrice {
    pub id: i64,
    pub article_id: i64,
    pub service_type_id: i64,
    pub service_id: i64,
    pub base_price: Money,
    pub premium_price: Money,
    pub price_per_kg: Option<Money>,
    pub pricing_type: StoredPricingType,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ArticleServicePrice {
    pub fn key(&self) -> PriceKey {
        PriceKey::new(self.article_id, self.service_type_id, self.service_id)
    }
}

#[cfg(feature = "sqlite")]
impl<'r> FromRow<'r, sqlx::sqlite::SqliteRow> for ArticleServicePrice {
    fn from_row(row: &'r sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;
        let pricing_type: String = row.try_get("pricing_type")?;
        Ok(Self {
            id: row.try_get("id")?,
            article_id: row.try_get("article_id")?,
            service_type_id: row.try_get("service_type_id")?,
            service_id: row.try_get("service_id")?,
            base_price: row.try_get("base_price")?,
            premium_price: row.try_get("premium_price")?,
            price_per_kg: row.try_get("price_per_kg")?,
            pricing_type: StoredPricingType::from(pricing_type),
            is_available: row.try_get("is_available")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// An admin price edit. Unknown pricing types never get this far: they are rejected when `pricing_type` is parsed.
#[derive(Debug, Clone)]
pub struct PriceUpdate {
    pub key: PriceKey,
    pub base_price: Money,
    pub premium_price: Money,
    pub price_per_kg: Option<Money>,
    pub pricing_type: PricingType,
    pub is_available: bool,
}

impl PriceUpdate {
    pub fn per_item(key: PriceKey, base_price: Money, premium_price: Money) -> Self {
        Self { key, base_price, premium_price, price_per_kg: None, pricing_type: PricingType::PerItem, is_available: true }
    }

    pub fn per_weight(key: PriceKey, price_per_kg: Money) -> Self {
        Self {
            key,
            base_price: price_per_kg,
            premium_price: price_per_kg,
            price_per_kg: Some(price_per_kg),
            pricing_type: PricingType::PerWeight,
            is_available: true,
        }
    }

    pub fn fixed(key: PriceKey, price: Money) -> Self {
        Self { key, base_price: price, premium_price: price, price_per_kg: None, pricing_type: PricingType::Fixed, is_available: true }
    }

    pub fn unavailable(mut self) -> Self {
        self.is_available = false;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base_price.is_negative() || self.premium_price.is_negative() {
            return Err(format!("Prices cannot be negative ({})", self.key));
        }
        match (self.pricing_type, self.price_per_kg) {
            (PricingType::PerWeight, None) => Err(format!("A per-weight price needs a price per kg ({})", self.key)),
            (_, Some(p)) if p.is_negative() => Err(format!("The price per kg cannot be negative ({})", self.key)),
            _ => Ok(()),
        }
    }
}

//--------------------------------------        Offers        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    Percentage,
    FixedAmount,
    PointsExchange,
}

/// What an offer takes off the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Discount {
    Percentage(Percent),
    FixedAmount(Money),
    PointsExchange { value: Money, points_required: i64 },
}

impl Discount {
    pub fn discount_type(&self) -> DiscountType {
        match self {
            Discount::Percentage(_) => DiscountType::Percentage,
            Discount::FixedAmount(_) => DiscountType::FixedAmount,
            Discount::PointsExchange { .. } => DiscountType::PointsExchange,
        }
    }

    /// The value as stored in `offers.discount_value`: basis points for percentages, minor units otherwise.
    pub fn stored_value(&self) -> i64 {
        match self {
            Discount::Percentage(p) => p.basis_points(),
            Discount::FixedAmount(v) => v.value(),
            Discount::PointsExchange { value, .. } => value.value(),
        }
    }

    pub fn points_required(&self) -> Option<i64> {
        match self {
            Discount::PointsExchange { points_required, .. } => Some(*points_required),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct OfferRow {
    pub id: i64,
    pub name: String,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    pub min_purchase_amount: Option<Money>,
    pub max_discount_amount: Option<Money>,
    pub points_required: Option<i64>,
    pub is_cumulative: bool,
    pub is_active: bool,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub id: i64,
    pub name: String,
    pub discount: Discount,
    pub min_purchase_amount: Option<Money>,
    pub max_discount_amount: Option<Money>,
    pub is_cumulative: bool,
    pub is_active: bool,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Articles the offer is restricted to. Empty means every article qualifies.
    pub eligible_articles: Vec<i64>,
}

impl Offer {
    pub fn try_from_row(row: OfferRow, eligible_articles: Vec<i64>) -> Result<Self, ConversionError> {
        let discount = match row.discount_type {
            DiscountType::Percentage => Discount::Percentage(Percent::from_basis_points(row.discount_value)),
            DiscountType::FixedAmount => Discount::FixedAmount(Money::from(row.discount_value)),
            DiscountType::PointsExchange => {
                let points_required = row.points_required.ok_or_else(|| {
                    ConversionError(format!("Points exchange offer #{} has no points requirement", row.id))
                })?;
                Discount::PointsExchange { value: Money::from(row.discount_value), points_required }
            },
        };
        Ok(Self {
            id: row.id,
            name: row.name,
            discount,
            min_purchase_amount: row.min_purchase_amount,
            max_discount_amount: row.max_discount_amount,
            is_cumulative: row.is_cumulative,
            is_active: row.is_active,
            start_date: row.start_date,
            end_date: row.end_date,
            eligible_articles,
        })
    }

    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.start_date <= now && now <= self.end_date
    }

    pub fn applies_to(&self, article_ids: &[i64]) -> bool {
        self.eligible_articles.is_empty() || article_ids.iter().any(|a| self.eligible_articles.contains(a))
    }

    pub fn meets_minimum(&self, subtotal: Money) -> bool {
        self.min_purchase_amount.map_or(true, |min| subtotal >= min)
    }
}

#[derive(Debug, Clone)]
pub struct NewOffer {
    pub name: String,
    pub discount: Discount,
    pub min_purchase_amount: Option<Money>,
    pub max_discount_amount: Option<Money>,
    pub is_cumulative: bool,
    pub is_active: bool,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub eligible_articles: Vec<i64>,
}

impl NewOffer {
    pub fn new<S: Into<String>>(name: S, discount: Discount, start_date: DateTime<Utc>, end_date: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            discount,
            min_purchase_amount: None,
            max_discount_amount: None,
            is_cumulative: false,
            is_active: true,
            start_date,
            end_date,
            eligible_articles: Vec::new(),
        }
    }

    pub fn with_min_purchase(mut self, amount: Money) -> Self {
        self.min_purchase_amount = Some(amount);
        self
    }

    pub fn with_max_discount(mut self, amount: Money) -> Self {
        self.max_discount_amount = Some(amount);
        self
    }

    pub fn cumulative(mut self) -> Self {
        self.is_cumulative = true;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn for_articles(mut self, article_ids: Vec<i64>) -> Self {
        self.eligible_articles = article_ids;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.start_date >= self.end_date {
            return Err(format!("Offer '{}' ends before it starts", self.name));
        }
        if self.min_purchase_amount.is_some_and(|m| m.is_negative()) {
            return Err(format!("Offer '{}' has a negative minimum purchase", self.name));
        }
        if self.max_discount_amount.is_some_and(|m| m.is_negative()) {
            return Err(format!("Offer '{}' has a negative discount cap", self.name));
        }
        match self.discount {
            Discount::Percentage(p) if p < Percent::ZERO || p > Percent::HUNDRED => {
                Err(format!("Offer '{}' has a percentage outside 0..=100: {p}", self.name))
            },
            Discount::FixedAmount(v) if v.is_negative() => Err(format!("Offer '{}' has a negative amount", self.name)),
            Discount::PointsExchange { value, points_required } if value.is_negative() || points_required <= 0 => {
                Err(format!("Offer '{}' needs a positive points requirement and a non-negative value", self.name))
            },
            _ => Ok(()),
        }
    }
}

//--------------------------------------   OrderStatusType    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatusType {
    Draft,
    Pending,
    Collecting,
    Collected,
    Processing,
    Ready,
    Delivering,
    Delivered,
    Cancelled,
}

impl OrderStatusType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Pending => "PENDING",
            Self::Collecting => "COLLECTING",
            Self::Collected => "COLLECTED",
            Self::Processing => "PROCESSING",
            Self::Ready => "READY",
            Self::Delivering => "DELIVERING",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// The single forward step from this status, if there is one.
    pub fn next(&self) -> Option<Self> {
        use OrderStatusType::*;
        match self {
            Draft => Some(Pending),
            Pending => Some(Collecting),
            Collecting => Some(Collected),
            Collected => Some(Processing),
            Processing => Some(Ready),
            Ready => Some(Delivering),
            Delivering => Some(Delivered),
            Delivered | Cancelled => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// | From \ To         | next step | CANCELLED | anything else |
    /// |-------------------|-----------|-----------|---------------|
    /// | pre-`DELIVERED`   | Ok        | Ok        | Err           |
    /// | `DELIVERED`       | -         | Err       | Err           |
    /// | `CANCELLED`       | -         | Err       | Err           |
    pub fn can_transition_to(&self, new_status: OrderStatusType) -> bool {
        if self.is_terminal() {
            return false;
        }
        new_status == Self::Cancelled || self.next() == Some(new_status)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use OrderStatusType::*;
        match s {
            "DRAFT" => Ok(Draft),
            "PENDING" => Ok(Pending),
            "COLLECTING" => Ok(Collecting),
            "COLLECTED" => Ok(Collected),
            "PROCESSING" => Ok(Processing),
            "READY" => Ok(Ready),
            "DELIVERING" => Ok(Delivering),
            "DELIVERED" => Ok(Delivered),
            "CANCELLED" => Ok(Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------         Role         ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Client,
    Affiliate,
    Delivery,
    Admin,
    SuperAdmin,
}

impl Role {
    pub fn can_drive_order_status(&self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin | Role::Delivery)
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::Client => "CLIENT",
            Role::Affiliate => "AFFILIATE",
            Role::Delivery => "DELIVERY",
            Role::Admin => "ADMIN",
            Role::SuperAdmin => "SUPER_ADMIN",
        };
        f.write_str(s)
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CLIENT" => Ok(Role::Client),
            "AFFILIATE" => Ok(Role::Affiliate),
            "DELIVERY" => Ok(Role::Delivery),
            "ADMIN" => Ok(Role::Admin),
            "SUPER_ADMIN" => Ok(Role::SuperAdmin),
            s => Err(ConversionError(format!("Unknown role: {s}"))),
        }
    }
}

/// Whoever is asking for a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: i64,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: i64, role: Role) -> Self {
        Self { user_id, role }
    }
}

//--------------------------------------        Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub address_id: i64,
    pub service_type_id: i64,
    pub status: OrderStatusType,
    /// Sum of line totals before discounts
    pub subtotal: Money,
    /// The computed price after discounts
    pub total_amount: Money,
    /// An admin override of `total_amount`
    pub manual_price: Option<Money>,
    pub payment_method: String,
    pub affiliate_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// The price the customer is charged.
    pub fn effective_price(&self) -> Money {
        self.manual_price.unwrap_or(self.total_amount)
    }
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub article_id: i64,
    pub service_id: i64,
    pub quantity: i64,
    pub weight: Option<f64>,
    /// Snapshot taken at settlement. Never recomputed.
    pub unit_price: Money,
    pub line_total: Money,
    pub pricing_type: String,
    pub is_premium: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderDiscount {
    pub id: i64,
    pub order_id: i64,
    pub offer_id: i64,
    pub amount: Money,
    pub points_spent: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderPayment {
    pub order_id: i64,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderStatusChange {
    pub id: i64,
    pub order_id: i64,
    pub old_status: OrderStatusType,
    pub new_status: OrderStatusType,
    pub changed_by: i64,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct PriceAdjustmentRecord {
    pub id: i64,
    pub order_id: i64,
    pub old_price: Money,
    pub new_price: Money,
    pub points_adjustment: i64,
    pub commission_delta: Money,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------       NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub article_id: i64,
    pub service_id: i64,
    pub quantity: i64,
    /// Weight in kilograms, for per-weight pricing
    pub weight: Option<f64>,
    pub is_premium: bool,
}

impl NewOrderItem {
    pub fn new(article_id: i64, service_id: i64, quantity: i64) -> Self {
        Self { article_id, service_id, quantity, weight: None, is_premium: false }
    }

    pub fn weighed(article_id: i64, service_id: i64, kilograms: f64) -> Self {
        Self { article_id, service_id, quantity: 1, weight: Some(kilograms), is_premium: false }
    }

    pub fn premium(mut self) -> Self {
        self.is_premium = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub user_id: i64,
    pub address_id: i64,
    pub service_type_id: i64,
    pub payment_method: String,
    /// When absent, the customer's active affiliate link (if any) supplies one
    pub affiliate_code: Option<String>,
    pub items: Vec<NewOrderItem>,
    /// Offers the customer asked to apply
    pub offer_ids: Vec<i64>,
}

impl NewOrder {
    pub fn new(user_id: i64, address_id: i64, service_type_id: i64) -> Self {
        Self {
            user_id,
            address_id,
            service_type_id,
            payment_method: "CASH".to_string(),
            affiliate_code: None,
            items: Vec::new(),
            offer_ids: Vec::new(),
        }
    }

    pub fn with_item(mut self, item: NewOrderItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_offer(mut self, offer_id: i64) -> Self {
        self.offer_ids.push(offer_id);
        self
    }

    pub fn with_affiliate_code<S: Into<String>>(mut self, code: S) -> Self {
        self.affiliate_code = Some(code.into());
        self
    }

    pub fn with_payment_method<S: Into<String>>(mut self, method: S) -> Self {
        self.payment_method = method.into();
        self
    }

    /// Distinct article ids, in order of first appearance.
    pub fn article_ids(&self) -> Vec<i64> {
        let mut seen = HashSet::new();
        self.items.iter().map(|i| i.article_id).filter(|id| seen.insert(*id)).collect()
    }

    /// Shape checks that need no store access.
    pub fn validate(&self) -> Result<(), String> {
        if self.items.is_empty() {
            return Err("An order needs at least one item".into());
        }
        if self.payment_method.trim().is_empty() {
            return Err("A payment method is required".into());
        }
        for item in &self.items {
            if item.quantity <= 0 {
                return Err(format!("Quantity for article #{} must be positive", item.article_id));
            }
            if let Some(w) = item.weight {
                if !w.is_finite() || w <= 0.0 {
                    return Err(format!("Weight for article #{} must be positive", item.article_id));
                }
            }
        }
        Ok(())
    }
}

//--------------------------------------       Loyalty        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PointTransactionType {
    Earned,
    Spent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PointSource {
    Order,
    Referral,
    Admin,
    OfferRedemption,
    PriceAdjustment,
}

impl Display for PointSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PointSource::Order => "ORDER",
            PointSource::Referral => "REFERRAL",
            PointSource::Admin => "ADMIN",
            PointSource::OfferRedemption => "OFFER_REDEMPTION",
            PointSource::PriceAdjustment => "PRICE_ADJUSTMENT",
        };
        f.write_str(s)
    }
}

impl FromStr for PointSource {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ORDER" => Ok(Self::Order),
            "REFERRAL" => Ok(Self::Referral),
            "ADMIN" => Ok(Self::Admin),
            "OFFER_REDEMPTION" => Ok(Self::OfferRedemption),
            "PRICE_ADJUSTMENT" => Ok(Self::PriceAdjustment),
            s => Err(ConversionError(format!("Unknown point source: {s}"))),
        }
    }
}

/// The materialised points balance for one user.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct LoyaltyAccount {
    pub user_id: i64,
    pub points_balance: i64,
    pub total_earned: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct PointTransaction {
    pub id: i64,
    pub user_id: i64,
    /// Positive when earned, negative when spent
    pub points: i64,
    pub transaction_type: PointTransactionType,
    pub source: PointSource,
    pub reference_id: String,
    pub created_at: DateTime<Utc>,
}

/// A request to move points. `points` is always a positive magnitude; the direction comes from the operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsEntry {
    pub user_id: i64,
    pub points: i64,
    pub source: PointSource,
    pub reference_id: String,
}

impl PointsEntry {
    pub fn new<S: Into<String>>(user_id: i64, points: i64, source: PointSource, reference_id: S) -> Self {
        Self { user_id, points, source, reference_id: reference_id.into() }
    }
}

//--------------------------------------      Affiliates      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AffiliateStatus {
    Pending,
    Active,
    Suspended,
}

impl Display for AffiliateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AffiliateStatus::Pending => "PENDING",
            AffiliateStatus::Active => "ACTIVE",
            AffiliateStatus::Suspended => "SUSPENDED",
        };
        f.write_str(s)
    }
}

impl FromStr for AffiliateStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "ACTIVE" => Ok(Self::Active),
            "SUSPENDED" => Ok(Self::Suspended),
            s => Err(ConversionError(format!("Unknown affiliate status: {s}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct AffiliateProfile {
    pub id: i64,
    pub user_id: i64,
    pub affiliate_code: String,
    pub parent_affiliate_id: Option<i64>,
    pub commission_rate: Percent,
    pub commission_balance: Money,
    pub total_earned: Money,
    pub monthly_earnings: Money,
    pub total_referrals: i64,
    pub is_active: bool,
    pub status: AffiliateStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AffiliateProfile {
    /// Only active, approved affiliates earn commission or withdraw.
    pub fn is_eligible(&self) -> bool {
        self.is_active && self.status == AffiliateStatus::Active
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAffiliate {
    pub user_id: i64,
    pub parent_code: Option<String>,
}

impl NewAffiliate {
    pub fn new(user_id: i64) -> Self {
        Self { user_id, parent_code: None }
    }

    pub fn with_parent_code<S: Into<String>>(mut self, code: S) -> Self {
        self.parent_code = Some(code.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct AffiliateLevel {
    pub id: i64,
    pub name: String,
    /// The tier applies once an affiliate has at least this many referrals
    pub min_referrals: i64,
    pub commission_rate: Percent,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAffiliateLevel {
    pub name: String,
    pub min_referrals: i64,
    pub commission_rate: Percent,
}

impl NewAffiliateLevel {
    pub fn new<S: Into<String>>(name: S, min_referrals: i64, commission_rate: Percent) -> Self {
        Self { name: name.into(), min_referrals, commission_rate }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommissionStatus {
    /// Earned commission, already added to the balance
    Credited,
    /// A withdrawal awaiting review
    Pending,
    Approved,
    Rejected,
}

impl Display for CommissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CommissionStatus::Credited => "CREDITED",
            CommissionStatus::Pending => "PENDING",
            CommissionStatus::Approved => "APPROVED",
            CommissionStatus::Rejected => "REJECTED",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct CommissionTransaction {
    pub id: i64,
    pub affiliate_id: i64,
    /// `None` for withdrawals
    pub order_id: Option<i64>,
    /// Positive for earnings, negative for withdrawals
    pub amount: Money,
    pub status: CommissionStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommissionTransaction {
    pub fn is_withdrawal(&self) -> bool {
        self.order_id.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct AffiliateClientLink {
    pub id: i64,
    pub affiliate_id: i64,
    pub client_id: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl AffiliateClientLink {
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        self.start_date <= at && self.end_date.map_or(true, |end| at <= end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAffiliateClientLink {
    pub affiliate_id: i64,
    pub client_id: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

impl NewAffiliateClientLink {
    pub fn open_ended(affiliate_id: i64, client_id: i64, start_date: DateTime<Utc>) -> Self {
        Self { affiliate_id, client_id, start_date, end_date: None }
    }

    pub fn until(mut self, end_date: DateTime<Utc>) -> Self {
        self.end_date = Some(end_date);
        self
    }
}
