//! Product creation with tiered pricing, listing and tier migration.

use mercado_core::{Price, PricingTiers, ProductId, ShopId, TierError};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::config::ConsoleConfig;
use crate::error::ErrorKind;
use crate::models::Product;
use crate::store::{
    FileUpload, ListQuery, ListResult, PRODUCTS, Record, RecordBody, RecordStore, StoreError,
    decode, filter,
};

/// Shown for products without an image.
pub const PLACEHOLDER_IMAGE_URL: &str = "https://via.placeholder.com/150?text=No+Image";

/// Errors from product actions.
#[derive(Debug, Error)]
pub enum ProductError {
    /// Input rejected before any remote call.
    #[error("{0}")]
    Validation(String),

    /// Stored tier data could not be read.
    #[error(transparent)]
    Tiers(#[from] TierError),

    /// The remote service failed or rejected the request.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ProductError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::Tiers(_) => ErrorKind::Validation,
            Self::Store(e) => e.kind(),
        }
    }
}

/// Input of a product create.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewProduct {
    /// Target shop; `None` until one is selected.
    pub shop: Option<ShopId>,
    pub name: String,
    pub base_price: Price,
    pub tiers: PricingTiers,
    pub image: Option<FileUpload>,
}

/// Result of rewriting legacy tier data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Products examined.
    pub scanned: usize,
    /// Products rewritten to the tagged shape.
    pub migrated: Vec<ProductId>,
    /// Legacy products whose tier data could not be decoded; left untouched.
    pub unreadable: Vec<ProductId>,
}

/// Product operations.
#[derive(Debug, Clone)]
pub struct ProductService<S> {
    store: S,
    page_size: u32,
}

impl<S: RecordStore> ProductService<S> {
    #[must_use]
    pub const fn new(store: S, config: &ConsoleConfig) -> Self {
        Self {
            store,
            page_size: config.page_size,
        }
    }

    /// Create a product in one call; multipart when an image is attached.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError::Validation`] without any remote call when no
    /// shop is selected, the name is blank or the price is negative;
    /// otherwise [`ProductError::Store`] with the service's message.
    #[instrument(skip(self, new), fields(name = %new.name, tiers = new.tiers.len()))]
    pub async fn create(&self, new: &NewProduct) -> Result<Product, ProductError> {
        let Some(shop) = &new.shop else {
            return Err(ProductError::Validation("Select a shop first.".to_owned()));
        };
        let name = new.name.trim();
        if name.is_empty() {
            return Err(ProductError::Validation("A product name is required.".to_owned()));
        }
        if new.base_price.is_negative() {
            return Err(ProductError::Validation(
                "The base price cannot be negative.".to_owned(),
            ));
        }

        let mut body = RecordBody::new()
            .field("name", name)
            .field("price", serde_json::to_value(new.base_price).unwrap_or(Value::Null))
            .field("shop", shop.as_str())
            .field("group_prices", new.tiers.to_value());
        if let Some(image) = &new.image {
            body = body.file(image.clone());
        }

        let record = self.store.create(PRODUCTS, body).await?;
        let product: Product = decode(record)?;
        info!(product = %product.id, shop = %product.shop, "product created");
        Ok(product)
    }

    /// One page of a shop's products, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError::Store`] if the request fails.
    pub async fn list_for_shop(
        &self,
        shop: &ShopId,
        page: u32,
    ) -> Result<ListResult<Product>, ProductError> {
        let query = ListQuery::page(page, self.page_size)
            .filter(filter::eq("shop", shop.as_str()))
            .sort("-created");
        let page = self.store.list(PRODUCTS, &query).await?;
        Ok(page.try_map(decode::<Product>)?)
    }

    /// Image URL of a product, or the placeholder when it has none.
    #[must_use]
    pub fn image_url(&self, product: &Product) -> String {
        if !product.has_image() {
            return PLACEHOLDER_IMAGE_URL.to_owned();
        }
        let mut record = Record::new();
        record.insert("id".to_owned(), Value::String(product.id.to_string()));
        record.insert(
            "collectionId".to_owned(),
            Value::String(product.collection_id.to_string()),
        );
        record.insert("image".to_owned(), Value::String(product.image.clone()));
        self.store
            .file_url(&record, "image")
            .unwrap_or_else(|| PLACEHOLDER_IMAGE_URL.to_owned())
    }

    /// Rewrite every legacy-shaped `group_prices` of a shop to the tagged
    /// shape. Tagged and empty values are left alone.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError::Store`] if a list or update fails; products
    /// already rewritten stay rewritten.
    #[instrument(skip(self), fields(shop = %shop))]
    pub async fn migrate_tiers(&self, shop: &ShopId) -> Result<MigrationReport, ProductError> {
        let mut report = MigrationReport::default();
        let mut legacy = Vec::new();
        let mut page_number = 1;

        loop {
            let page = self.list_for_shop(shop, page_number).await?;
            report.scanned += page.items.len();
            let has_more = page.has_more();
            legacy.extend(
                page.items
                    .into_iter()
                    .filter(|product| product.tier_shape().is_legacy()),
            );
            if !has_more {
                break;
            }
            page_number += 1;
        }

        for product in legacy {
            match product.pricing() {
                Ok(tiers) => {
                    let body = RecordBody::new().field("group_prices", tiers.to_value());
                    self.store
                        .update(PRODUCTS, product.id.as_str(), body)
                        .await?;
                    report.migrated.push(product.id);
                }
                Err(e) => {
                    warn!(product = %product.id, error = %e, "skipping unreadable tier data");
                    report.unreadable.push(product.id);
                }
            }
        }

        info!(
            scanned = report.scanned,
            migrated = report.migrated.len(),
            unreadable = report.unreadable.len(),
            "tier migration finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mercado_core::{GroupPrice, GroupPriceField, TierForm};
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;
    use crate::store::{MemoryStore, SHOPS, StoreOp};

    fn service(store: &MemoryStore) -> ProductService<MemoryStore> {
        ProductService::new(store.clone(), &ConsoleConfig::default())
    }

    fn caja_tiers() -> PricingTiers {
        let mut form = TierForm::<GroupPrice>::new();
        let i = form.add_tier();
        form.update_tier(i, GroupPriceField::Units, "24").unwrap();
        form.update_tier(i, GroupPriceField::UnitPrice, "260").unwrap();
        form.update_tier(i, GroupPriceField::MinQty, "5").unwrap();
        PricingTiers::grouped(&form)
    }

    #[tokio::test]
    async fn test_create_writes_tagged_tiers() {
        let store = MemoryStore::new();
        let shop = store.insert(SHOPS, json!({"name": "A"}));
        let products = service(&store);
        let product = products
            .create(&NewProduct {
                shop: Some(ShopId::new(shop["id"].as_str().unwrap())),
                name: "Refresco".to_owned(),
                base_price: Price::new(Decimal::from(18)),
                tiers: caja_tiers(),
                image: None,
            })
            .await
            .unwrap();
        assert_eq!(product.group_prices["kind"], "grouped");
        assert_eq!(product.group_prices["tiers"][0]["unit_price"], json!(260.0));
        assert_eq!(products.image_url(&product), PLACEHOLDER_IMAGE_URL);
    }

    #[tokio::test]
    async fn test_create_with_image() {
        let store = MemoryStore::new();
        let products = service(&store);
        let product = products
            .create(&NewProduct {
                shop: Some(ShopId::new("s1")),
                name: "Pan".to_owned(),
                image: Some(FileUpload {
                    field: "image".to_owned(),
                    file_name: "pan.png".to_owned(),
                    mime: Some("image/png".to_owned()),
                    bytes: vec![0x89, b'P', b'N', b'G'],
                }),
                ..NewProduct::default()
            })
            .await
            .unwrap();
        let url = products.image_url(&product);
        assert!(url.ends_with("/pan.png"), "{url}");
    }

    #[tokio::test]
    async fn test_validation_happens_before_any_call() {
        let store = MemoryStore::new();
        let products = service(&store);
        for new in [
            NewProduct {
                name: "Sin tienda".to_owned(),
                ..NewProduct::default()
            },
            NewProduct {
                shop: Some(ShopId::new("s1")),
                name: "  ".to_owned(),
                ..NewProduct::default()
            },
            NewProduct {
                shop: Some(ShopId::new("s1")),
                name: "Negativo".to_owned(),
                base_price: Price::new(Decimal::from(-1)),
                ..NewProduct::default()
            },
        ] {
            let err = products.create(&new).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_list_for_shop_filters_and_sorts() {
        let store = MemoryStore::new();
        let _ = store.insert(PRODUCTS, json!({"name": "Old", "shop": "s1"}));
        let _ = store.insert(PRODUCTS, json!({"name": "Other", "shop": "s2"}));
        let _ = store.insert(PRODUCTS, json!({"name": "New", "shop": "s1"}));
        let page = service(&store).list_for_shop(&ShopId::new("s1"), 1).await.unwrap();
        let names: Vec<&str> = page.items.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["New", "Old"]);
    }

    #[tokio::test]
    async fn test_migrate_tiers() {
        let store = MemoryStore::new();
        let _ = store.insert(
            PRODUCTS,
            json!({"name": "Array", "shop": "s1",
                   "group_prices": [{"name": "Caja", "units": 24, "unit_price": 260, "min_qty": 5}]}),
        );
        let _ = store.insert(
            PRODUCTS,
            json!({"name": "Map", "shop": "s1", "group_prices": {"Mayorista": 90}}),
        );
        let _ = store.insert(
            PRODUCTS,
            json!({"name": "Tagged", "shop": "s1", "group_prices": caja_tiers().to_value()}),
        );
        let _ = store.insert(
            PRODUCTS,
            json!({"name": "Broken", "shop": "s1", "group_prices": [{"name": "Caja"}]}),
        );

        let report = service(&store).migrate_tiers(&ShopId::new("s1")).await.unwrap();
        assert_eq!(report.scanned, 4);
        assert_eq!(report.migrated.len(), 2);
        assert_eq!(report.unreadable.len(), 1);
        assert_eq!(store.calls_of(StoreOp::Update).len(), 2);

        let records = store.records(PRODUCTS);
        let map = records.iter().find(|r| r["name"] == "Map").unwrap();
        assert_eq!(map["group_prices"], json!({"kind": "flat", "prices": {"Mayorista": 90.0}}));
        let broken = records.iter().find(|r| r["name"] == "Broken").unwrap();
        assert_eq!(broken["group_prices"], json!([{"name": "Caja"}]));

        let again = service(&store).migrate_tiers(&ShopId::new("s1")).await.unwrap();
        assert!(again.migrated.is_empty());
    }
}
