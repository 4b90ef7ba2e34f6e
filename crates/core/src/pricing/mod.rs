//! Volume (tiered) pricing for products.
//!
//! A product carries one of two tier shapes:
//!
//! - **Grouped** ([`GroupPrice`]): named packages with units per package,
//!   unit price and a minimum package count, each totaled independently.
//! - **Flat** ([`FlatTier`]): a tier name mapped to a single price. Rows are
//!   folded into a map on submit, so a later duplicate name wins.
//!
//! [`PricingTiers`] is the canonical, `kind`-tagged representation written to
//! the `group_prices` field of a product record. Records written by older
//! clients hold either a bare array (grouped) or a bare object (flat);
//! [`PricingTiers::from_stored`] reads all three shapes.
//!
//! ```
//! use mercado_core::{GroupPrice, GroupPriceField, PricingTiers, TierForm};
//!
//! let mut form = TierForm::<GroupPrice>::new();
//! let i = form.add_tier();
//! form.update_tier(i, GroupPriceField::Units, "24").unwrap();
//! form.update_tier(i, GroupPriceField::UnitPrice, "260").unwrap();
//! form.update_tier(i, GroupPriceField::MinQty, "5").unwrap();
//!
//! assert_eq!(form.rows()[0].formatted_total(), "31200.00");
//!
//! let tiers = PricingTiers::grouped(&form);
//! assert_eq!(tiers.len(), 1);
//! ```

mod flat;
mod form;
mod group;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use flat::{FlatTier, FlatTierField, fold_flat_tiers};
pub use form::TierForm;
pub use group::{GroupPrice, GroupPriceField};

use crate::types::Price;

/// Errors from editing or decoding pricing tiers.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TierError {
    /// Tier index is past the end of the collection.
    #[error("tier index {index} out of bounds (have {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    /// A numeric field received text that is not a number.
    #[error("{field} must be a number (got '{value}')")]
    InvalidNumber { field: &'static str, value: String },

    /// Unknown field name.
    #[error("unknown tier field: {0}")]
    UnknownField(String),

    /// Stored tier data matches none of the known shapes.
    #[error("unrecognized pricing tiers: {0}")]
    InvalidShape(String),
}

/// A row type editable through a [`TierForm`].
pub trait TierRow: Clone {
    /// Field selector used by [`TierForm::update_tier`].
    type Field: Copy;

    /// Row appended by [`TierForm::add_tier`].
    fn default_row() -> Self;

    /// Tier name.
    fn name(&self) -> &str;

    /// Set one field from raw form text.
    ///
    /// # Errors
    ///
    /// Returns [`TierError::InvalidNumber`] when a numeric field cannot be
    /// parsed; the row is left unchanged.
    fn set_field(&mut self, field: Self::Field, value: &str) -> Result<(), TierError>;
}

/// Canonical pricing tiers of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PricingTiers {
    /// Ordered packaging tiers; names may repeat.
    Grouped { tiers: Vec<GroupPrice> },
    /// Name-keyed flat prices; names are unique.
    Flat { prices: BTreeMap<String, Price> },
}

/// Shape a `group_prices` value was stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredShape {
    /// Field is absent or null.
    Empty,
    /// Tagged with `kind`.
    Tagged,
    /// Bare array of grouped tiers.
    LegacyGrouped,
    /// Bare object of name to price.
    LegacyFlat,
}

impl StoredShape {
    /// Whether rewriting the record would change its stored shape.
    #[must_use]
    pub const fn is_legacy(self) -> bool {
        matches!(self, Self::LegacyGrouped | Self::LegacyFlat)
    }
}

impl Default for PricingTiers {
    fn default() -> Self {
        Self::Grouped { tiers: Vec::new() }
    }
}

impl PricingTiers {
    /// Grouped tiers from the form, verbatim and in order.
    #[must_use]
    pub fn grouped(form: &TierForm<GroupPrice>) -> Self {
        Self::Grouped {
            tiers: form.rows().to_vec(),
        }
    }

    /// Flat tiers folded from the form; later duplicate names win.
    #[must_use]
    pub fn flat(form: &TierForm<FlatTier>) -> Self {
        Self::Flat {
            prices: fold_flat_tiers(form.rows()),
        }
    }

    /// Number of tiers.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Grouped { tiers } => tiers.len(),
            Self::Flat { prices } => prices.len(),
        }
    }

    /// Whether there are no tiers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Identify which shape a stored value uses.
    #[must_use]
    pub fn detect_shape(value: &Value) -> StoredShape {
        match value {
            Value::Null => StoredShape::Empty,
            Value::Array(_) => StoredShape::LegacyGrouped,
            Value::Object(map) if map.contains_key("kind") => StoredShape::Tagged,
            Value::Object(_) => StoredShape::LegacyFlat,
            Value::String(s) => serde_json::from_str::<Value>(s)
                .map_or(StoredShape::Empty, |inner| match inner {
                    Value::String(_) => StoredShape::Empty,
                    other => Self::detect_shape(&other),
                }),
            Value::Bool(_) | Value::Number(_) => StoredShape::Empty,
        }
    }

    /// Decode a stored `group_prices` value in any known shape.
    ///
    /// A JSON-encoded string (how multipart submissions may come back) is
    /// decoded once before matching.
    ///
    /// # Errors
    ///
    /// Returns [`TierError::InvalidShape`] if the value matches no shape or
    /// its entries are malformed.
    pub fn from_stored(value: &Value) -> Result<Self, TierError> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::String(s) if s.trim().is_empty() => Ok(Self::default()),
            Value::String(s) => {
                let inner: Value =
                    serde_json::from_str(s).map_err(|e| TierError::InvalidShape(e.to_string()))?;
                if inner.is_string() {
                    return Err(TierError::InvalidShape("doubly encoded string".to_owned()));
                }
                Self::from_stored(&inner)
            }
            Value::Array(_) => {
                let tiers: Vec<GroupPrice> = serde_json::from_value(value.clone())
                    .map_err(|e| TierError::InvalidShape(e.to_string()))?;
                Ok(Self::Grouped { tiers })
            }
            Value::Object(map) if map.contains_key("kind") => serde_json::from_value(value.clone())
                .map_err(|e| TierError::InvalidShape(e.to_string())),
            Value::Object(_) => {
                let prices: BTreeMap<String, Price> = serde_json::from_value(value.clone())
                    .map_err(|e| TierError::InvalidShape(e.to_string()))?;
                Ok(Self::Flat { prices })
            }
            Value::Bool(_) | Value::Number(_) => Err(TierError::InvalidShape(value.to_string())),
        }
    }

    /// Canonical JSON for the record field.
    #[must_use]
    pub fn to_value(&self) -> Value {
        // Serializing plain structs, strings and floats cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
