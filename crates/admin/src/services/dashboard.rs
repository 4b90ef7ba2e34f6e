//! Landing summary.

use mercado_core::Price;

use super::shops::{ShopError, ShopService};
use crate::models::Shop;
use crate::session::Principal;
use crate::store::RecordStore;

/// What the dashboard shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSummary {
    pub principal: Principal,
    /// Shops the principal manages.
    pub active_shops: u64,
    /// Sales are not tracked yet; always zero.
    pub monthly_sales: Price,
    /// A standard user's own shops; empty for superusers.
    pub my_shops: Vec<Shop>,
}

/// Builds the dashboard from the shop service.
#[derive(Debug)]
pub struct Dashboard<'a, S> {
    shops: &'a ShopService<S>,
}

impl<'a, S: RecordStore> Dashboard<'a, S> {
    #[must_use]
    pub const fn new(shops: &'a ShopService<S>) -> Self {
        Self { shops }
    }

    /// Summarize for the principal of the shop service's session.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::NotAuthenticated`] or a store failure.
    pub async fn summary(&self) -> Result<DashboardSummary, ShopError> {
        let principal = self.shops.principal()?;
        let active_shops = self.shops.count().await?;
        let my_shops = if principal.is_superuser() {
            Vec::new()
        } else {
            self.shops.list_owned(&principal.id).await?.items
        };
        Ok(DashboardSummary {
            principal,
            active_shops,
            monthly_sales: Price::ZERO,
            my_shops,
        })
    }
}
