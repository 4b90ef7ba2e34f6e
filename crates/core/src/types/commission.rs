//! Platform commission rate charged to a shop.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::price::parse_decimal;

/// Errors that can occur when building a [`CommissionRate`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CommissionRateError {
    /// The input is not a number.
    #[error("commission rate '{0}' is not a number")]
    NotANumber(String),
    /// The rate is outside 0-100.
    #[error("commission rate must be between 0 and 100 (got {0})")]
    OutOfRange(Decimal),
}

/// A percentage between 0 and 100 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "CommissionRepr", into = "CommissionRepr")]
pub struct CommissionRate(Decimal);

impl CommissionRate {
    /// Rate pre-filled in the shop creation form.
    pub const DEFAULT_PERCENT: i64 = 10;

    /// Create a rate, checking the 0-100 range.
    ///
    /// # Errors
    ///
    /// Returns [`CommissionRateError::OutOfRange`] outside 0-100.
    pub fn new(percent: Decimal) -> Result<Self, CommissionRateError> {
        if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
            return Err(CommissionRateError::OutOfRange(percent));
        }
        Ok(Self(percent))
    }

    /// The rate as a percentage.
    #[must_use]
    pub const fn percent(&self) -> Decimal {
        self.0
    }
}

impl Default for CommissionRate {
    fn default() -> Self {
        Self(Decimal::from(Self::DEFAULT_PERCENT))
    }
}

impl fmt::Display for CommissionRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0.normalize())
    }
}

impl FromStr for CommissionRate {
    type Err = CommissionRateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let percent =
            parse_decimal(s).map_err(|_| CommissionRateError::NotANumber(s.trim().to_owned()))?;
        Self::new(percent)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(transparent)]
struct CommissionRepr(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl TryFrom<CommissionRepr> for CommissionRate {
    type Error = CommissionRateError;

    fn try_from(repr: CommissionRepr) -> Result<Self, Self::Error> {
        Self::new(repr.0)
    }
}

impl From<CommissionRate> for CommissionRepr {
    fn from(rate: CommissionRate) -> Self {
        Self(rate.0)
    }
}
