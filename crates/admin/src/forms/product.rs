//! Product creation form, including its pricing tier rows.

use mercado_core::{FlatTier, GroupPrice, Price, PricingTiers, ShopId, TierForm};

use crate::models::Product;
use crate::services::{NewProduct, ProductError, ProductService};
use crate::store::{FileUpload, RecordStore};

/// In-progress tiers, in the shape the product will be saved with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TierEditor {
    Grouped(TierForm<GroupPrice>),
    Flat(TierForm<FlatTier>),
}

impl Default for TierEditor {
    fn default() -> Self {
        Self::Grouped(TierForm::new())
    }
}

impl TierEditor {
    /// Canonical tiers for submission.
    #[must_use]
    pub fn to_tiers(&self) -> PricingTiers {
        match self {
            Self::Grouped(form) => PricingTiers::grouped(form),
            Self::Flat(form) => PricingTiers::flat(form),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Grouped(form) => form.len(),
            Self::Flat(form) => form.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every row, keeping the shape.
    pub fn clear(&mut self) {
        match self {
            Self::Grouped(form) => form.clear(),
            Self::Flat(form) => form.clear(),
        }
    }
}

/// The "new product" form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductForm {
    /// Selected shop; kept across submissions.
    pub shop: Option<ShopId>,
    pub name: String,
    pub base_price: Price,
    pub tiers: TierEditor,
    pub image: Option<FileUpload>,
}

impl ProductForm {
    /// A form targeting `shop`.
    #[must_use]
    pub fn for_shop(shop: ShopId) -> Self {
        Self {
            shop: Some(shop),
            ..Self::default()
        }
    }

    /// Create the product. Everything but the selected shop is reset on
    /// success.
    ///
    /// # Errors
    ///
    /// Returns the [`ProductError`] of the create; the form is left untouched.
    pub async fn submit<S: RecordStore>(
        &mut self,
        products: &ProductService<S>,
    ) -> Result<Product, ProductError> {
        let new = NewProduct {
            shop: self.shop.clone(),
            name: self.name.clone(),
            base_price: self.base_price,
            tiers: self.tiers.to_tiers(),
            image: self.image.clone(),
        };
        let product = products.create(&new).await?;
        self.name.clear();
        self.base_price = Price::ZERO;
        self.tiers.clear();
        self.image = None;
        Ok(product)
    }
}
