use laundry_common::Money;
use thiserror::Error;

/// Every failure the settlement engine reports to its callers.
///
/// Business-rule rejections ([`EngineError::is_business_rejection`]) are expected outcomes that callers should relay to
/// the user. Everything else is a fault.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    ValidationError(String),
    #[error("Insufficient points. Available: {available}, requested: {requested}")]
    InsufficientPoints { available: i64, requested: i64 },
    #[error("Insufficient commission balance. Available: {available}, requested: {requested}")]
    InsufficientCommission { available: Money, requested: Money },
    #[error("Cannot move from {from} to {to}")]
    InvalidTransition { from: String, to: String },
    #[error("{0} is not active")]
    InactiveResource(String),
    #[error("Missing pricing configuration: {0}")]
    MissingConfiguration(String),
    #[error("Order #{0} has already been paid")]
    OrderAlreadyPaid(i64),
    #[error("Role {0} is not allowed to perform this action")]
    InsufficientPermissions(String),
    #[error("Internal invariant violated: the points balance for user #{user_id} would be {balance}")]
    NegativeBalanceInvariantViolation { user_id: i64, balance: i64 },
}

impl EngineError {
    pub fn not_found<S: Into<String>>(what: S) -> Self {
        Self::NotFound(what.into())
    }

    pub fn invalid<S: Into<String>>(reason: S) -> Self {
        Self::ValidationError(reason.into())
    }

    pub fn is_business_rejection(&self) -> bool {
        !matches!(self, Self::DatabaseError(_) | Self::NegativeBalanceInvariantViolation { .. })
    }
}
