//! Flat tiers: a tier name mapped straight to a price.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{TierError, TierRow};
use crate::types::Price;
use crate::types::price::parse_decimal;

/// One row of the flat tier editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatTier {
    pub name: String,
    pub price: Price,
}

impl FlatTier {
    /// Create a row.
    #[must_use]
    pub fn new(name: impl Into<String>, price: Price) -> Self {
        Self {
            name: name.into(),
            price,
        }
    }
}

/// Editable fields of a [`FlatTier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlatTierField {
    Name,
    Price,
}

impl FromStr for FlatTierField {
    type Err = TierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "price" => Ok(Self::Price),
            other => Err(TierError::UnknownField(other.to_owned())),
        }
    }
}

impl TierRow for FlatTier {
    type Field = FlatTierField;

    fn default_row() -> Self {
        Self::new(super::GroupPrice::DEFAULT_NAME, Price::ZERO)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_field(&mut self, field: FlatTierField, value: &str) -> Result<(), TierError> {
        match field {
            FlatTierField::Name => self.name = value.to_owned(),
            FlatTierField::Price => {
                let amount = parse_decimal(value).map_err(|_| TierError::InvalidNumber {
                    field: "price",
                    value: value.to_owned(),
                })?;
                self.price = Price::new(amount);
            }
        }
        Ok(())
    }
}

/// Fold rows into a name-keyed map.
///
/// A later row silently overwrites an earlier row with the same name.
#[must_use]
pub fn fold_flat_tiers(rows: &[FlatTier]) -> BTreeMap<String, Price> {
    let mut prices = BTreeMap::new();
    for row in rows {
        prices.insert(row.name.clone(), row.price);
    }
    prices
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn row(name: &str, price: i64) -> FlatTier {
        FlatTier::new(name, Price::new(Decimal::from(price)))
    }

    #[test]
    fn test_fold_last_write_wins() {
        let folded = fold_flat_tiers(&[row("A", 10), row("A", 20)]);
        assert_eq!(folded.len(), 1);
        assert_eq!(folded.get("A"), Some(&Price::new(Decimal::from(20))));
    }

    #[test]
    fn test_fold_keeps_distinct_names() {
        let folded = fold_flat_tiers(&[row("Caja", 100), row("Pallet", 900), row("Caja", 120)]);
        assert_eq!(folded.len(), 2);
        assert_eq!(folded.get("Caja"), Some(&Price::new(Decimal::from(120))));
        assert_eq!(folded.get("Pallet"), Some(&Price::new(Decimal::from(900))));
    }

    #[test]
    fn test_fold_empty() {
        assert!(fold_flat_tiers(&[]).is_empty());
    }
}
