//! Type-safe price representation using decimal arithmetic.
//!
//! The remote service stores prices as plain JSON numbers, so [`Price`]
//! serializes through `rust_decimal::serde::float` while all arithmetic stays
//! in [`Decimal`].

use core::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Price`] or any numeric form field.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input is not a number.
    #[error("'{0}' is not a number")]
    NotANumber(String),
}

/// A currency amount in the marketplace's single currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Price {
    /// The zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Get the decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is below zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Format with exactly two decimal places and a `$` prefix (e.g. `$19.99`).
    #[must_use]
    pub fn display(&self) -> String {
        format!("${}", fixed2(self.0))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&fixed2(self.0))
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_decimal(s).map(Self)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

/// Render a decimal with exactly two fractional digits.
///
/// Extra digits are truncated toward zero, so `10.005` renders as `10.00`.
#[must_use]
pub fn fixed2(value: Decimal) -> String {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::ToZero);
    rounded.rescale(2);
    rounded.to_string()
}

/// Parse a numeric form value.
///
/// Blank input reads as zero, like an emptied number input. Scientific
/// notation (`1e3`) is accepted.
///
/// # Errors
///
/// Returns [`PriceError::NotANumber`] for anything else.
pub fn parse_decimal(s: &str) -> Result<Decimal, PriceError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Ok(Decimal::ZERO);
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| PriceError::NotANumber(trimmed.to_owned()))
}
