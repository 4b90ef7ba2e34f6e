//! Grouped (packaging) tiers: named packages with units, unit price and a
//! minimum package quantity.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{TierError, TierRow};
use crate::types::Price;
use crate::types::price::{fixed2, parse_decimal};

/// One packaging option of a product, e.g. "Caja" of 24 units at 260 each,
/// sold from 5 boxes up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPrice {
    /// Package name (Caja, Saco, Pallet).
    pub name: String,
    /// Units per package.
    #[serde(with = "rust_decimal::serde::float")]
    pub units: Decimal,
    /// Price of a single unit.
    pub unit_price: Price,
    /// Minimum number of packages per order.
    #[serde(with = "rust_decimal::serde::float")]
    pub min_qty: Decimal,
}

impl GroupPrice {
    /// Package name given to a freshly added tier.
    pub const DEFAULT_NAME: &'static str = "Caja";

    /// Create a tier.
    #[must_use]
    pub fn new(name: impl Into<String>, units: Decimal, unit_price: Price, min_qty: Decimal) -> Self {
        Self {
            name: name.into(),
            units,
            unit_price,
            min_qty,
        }
    }

    /// `units x unit_price x min_qty`.
    ///
    /// Zero or negative inputs are not rejected; they propagate through the
    /// product. Saturates instead of overflowing.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.units
            .saturating_mul(self.unit_price.amount())
            .saturating_mul(self.min_qty)
    }

    /// [`total`](Self::total) rendered with exactly two decimal places.
    #[must_use]
    pub fn formatted_total(&self) -> String {
        fixed2(self.total())
    }
}

impl Default for GroupPrice {
    fn default() -> Self {
        Self::new(Self::DEFAULT_NAME, Decimal::ONE, Price::ZERO, Decimal::ONE)
    }
}

/// Editable fields of a [`GroupPrice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupPriceField {
    Name,
    Units,
    UnitPrice,
    MinQty,
}

impl GroupPriceField {
    /// Field name as stored on the record.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Units => "units",
            Self::UnitPrice => "unit_price",
            Self::MinQty => "min_qty",
        }
    }
}

impl FromStr for GroupPriceField {
    type Err = TierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "units" => Ok(Self::Units),
            "unit_price" => Ok(Self::UnitPrice),
            "min_qty" => Ok(Self::MinQty),
            other => Err(TierError::UnknownField(other.to_owned())),
        }
    }
}

impl TierRow for GroupPrice {
    type Field = GroupPriceField;

    fn default_row() -> Self {
        Self::default()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_field(&mut self, field: GroupPriceField, value: &str) -> Result<(), TierError> {
        let number = || {
            parse_decimal(value).map_err(|_| TierError::InvalidNumber {
                field: field.as_str(),
                value: value.to_owned(),
            })
        };
        match field {
            GroupPriceField::Name => self.name = value.to_owned(),
            GroupPriceField::Units => self.units = number()?,
            GroupPriceField::UnitPrice => self.unit_price = Price::new(number()?),
            GroupPriceField::MinQty => self.min_qty = number()?,
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn tier(units: i64, unit_price: i64, min_qty: i64) -> GroupPrice {
        GroupPrice::new(
            "Caja",
            Decimal::from(units),
            Price::new(Decimal::from(unit_price)),
            Decimal::from(min_qty),
        )
    }

    #[test]
    fn test_total_of_box_tier() {
        assert_eq!(tier(24, 260, 5).formatted_total(), "31200.00");
    }

    #[test]
    fn test_total_is_product_of_fields() {
        for (u, p, q) in [(1, 0, 1), (3, 7, 11), (12, 99, 2), (100, 1, 100)] {
            assert_eq!(tier(u, p, q).total(), Decimal::from(u * p * q));
        }
    }

    #[test]
    fn test_zero_and_negative_inputs_propagate() {
        assert_eq!(tier(0, 260, 5).formatted_total(), "0.00");
        assert_eq!(tier(-2, 10, 1).formatted_total(), "-20.00");
    }

    #[test]
    fn test_fractional_unit_price() {
        let t = GroupPrice::new(
            "Saco",
            Decimal::from(3),
            Price::new(Decimal::new(3335, 3)),
            Decimal::ONE,
        );
        // 3 x 3.335 = 10.005
        assert_eq!(t.formatted_total(), "10.00");
        assert_eq!(t.total(), Decimal::new(10005, 3));
    }

    #[test]
    fn test_default_tier() {
        let t = GroupPrice::default_row();
        assert_eq!(t.name, "Caja");
        assert_eq!(t.units, Decimal::ONE);
        assert_eq!(t.unit_price, Price::ZERO);
        assert_eq!(t.min_qty, Decimal::ONE);
    }

    #[test]
    fn test_set_field_rejects_non_numeric() {
        let mut t = GroupPrice::default();
        let err = t.set_field(GroupPriceField::Units, "doce").unwrap_err();
        assert!(matches!(err, TierError::InvalidNumber { field: "units", .. }));
        assert_eq!(t.units, Decimal::ONE);
    }

    #[test]
    fn test_serializes_numbers() {
        let json = serde_json::to_value(tier(24, 260, 5)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "Caja", "units": 24.0, "unit_price": 260.0, "min_qty": 5.0})
        );
    }
}
