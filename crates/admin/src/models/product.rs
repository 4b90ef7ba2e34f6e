//! Product records.

use mercado_core::{
    CollectionId, Price, PricingTiers, ProductId, ShopId, StoredShape, TierError,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A record of the `products` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(rename = "collectionId", default)]
    pub collection_id: CollectionId,
    pub name: String,
    #[serde(default)]
    pub price: Price,
    pub shop: ShopId,
    /// Stored file name; empty when no image was uploaded.
    #[serde(default)]
    pub image: String,
    /// Raw tier data in whichever shape it was written.
    #[serde(default)]
    pub group_prices: Value,
    #[serde(default)]
    pub created: String,
}

impl Product {
    /// Decoded pricing tiers.
    ///
    /// # Errors
    ///
    /// Returns [`TierError::InvalidShape`] if `group_prices` is malformed.
    pub fn pricing(&self) -> Result<PricingTiers, TierError> {
        PricingTiers::from_stored(&self.group_prices)
    }

    /// Shape `group_prices` is stored in.
    #[must_use]
    pub fn tier_shape(&self) -> StoredShape {
        PricingTiers::detect_shape(&self.group_prices)
    }

    #[must_use]
    pub fn has_image(&self) -> bool {
        !self.image.is_empty()
    }
}
