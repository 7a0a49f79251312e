use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::Money;

const BASIS_POINTS_PER_PERCENT: i64 = 100;
const FULL: i64 = 100 * BASIS_POINTS_PER_PERCENT;

//--------------------------------------      Percent       ---------------------------------------------------------
/// A rate in hundredths of a percent (basis points). `Percent::whole(10)` is 10%.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Percent(i64);

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a percentage: {0}")]
pub struct PercentConversionError(String);

impl Percent {
    pub const ZERO: Percent = Percent(0);
    pub const HUNDRED: Percent = Percent(FULL);

    pub const fn whole(percent: i64) -> Self {
        Self(percent * BASIS_POINTS_PER_PERCENT)
    }

    pub const fn from_basis_points(basis_points: i64) -> Self {
        Self(basis_points)
    }

    pub fn basis_points(&self) -> i64 {
        self.0
    }

    /// Applies the rate to `amount`, rounding half away from zero to the nearest minor unit.
    pub fn of(&self, amount: Money) -> Money {
        let n = i128::from(amount.value()) * i128::from(self.0);
        let d = i128::from(FULL);
        let rounded = if n >= 0 { (n + d / 2) / d } else { (n - d / 2) / d };
        Money::from(rounded as i64)
    }
}

impl Display for Percent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per = BASIS_POINTS_PER_PERCENT.unsigned_abs();
        write!(f, "{sign}{}.{:02}%", abs / per, abs % per)
    }
}

impl FromStr for Percent {
    type Err = PercentConversionError;

    /// Parses `"10"`, `"12.5"` or `"12.5%"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches('%');
        let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
        if whole.is_empty() || fraction.len() > 2 || whole.starts_with('-') {
            return Err(PercentConversionError(s.to_string()));
        }
        let whole = whole.parse::<i64>().map_err(|e| PercentConversionError(format!("{s}: {e}")))?;
        let fraction = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|e| PercentConversionError(format!("{s}: {e}")))? * 10,
            _ => fraction.parse::<i64>().map_err(|e| PercentConversionError(format!("{s}: {e}")))?,
        };
        Ok(Self(whole * BASIS_POINTS_PER_PERCENT + fraction))
    }
}
