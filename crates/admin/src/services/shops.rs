//! Shop creation, listing and deletion.

use mercado_core::{CommissionRate, EmailError, ShopId, UserId};
use secrecy::SecretString;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, instrument, warn};

use super::ownership::{Confirm, OwnerPolicy, OwnerResolution, resolve_owner};
use crate::config::ConsoleConfig;
use crate::error::ErrorKind;
use crate::models::Shop;
use crate::session::{Principal, SessionHandle};
use crate::store::{
    ListQuery, ListResult, RecordBody, RecordStore, SHOPS, StoreError, decode, filter,
};

/// Errors from shop actions.
#[derive(Debug, Error)]
pub enum ShopError {
    /// Input rejected before any remote call.
    #[error("{0}")]
    Validation(String),

    /// Owner email is malformed.
    #[error("Invalid owner email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// No user has the given owner email.
    #[error("No user found with email {0}. Create the user first.")]
    OwnerNotFound(String),

    /// The operator declined to provision the owner.
    #[error("Shop not created: owner {0} was not provisioned.")]
    ProvisionDeclined(String),

    /// No one is logged in.
    #[error("You must log in first.")]
    NotAuthenticated,

    /// The remote service failed or rejected the request.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ShopError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_)
            | Self::InvalidEmail(_)
            | Self::ProvisionDeclined(_)
            | Self::NotAuthenticated => ErrorKind::Validation,
            Self::OwnerNotFound(_) => ErrorKind::LookupMiss,
            Self::Store(e) => e.kind(),
        }
    }
}

/// Input of a shop create.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewShop {
    pub name: String,
    pub commission: CommissionRate,
    /// Only read for superusers.
    pub owner_email: String,
}

/// Shop operations for the logged-in principal.
#[derive(Debug, Clone)]
pub struct ShopService<S> {
    store: S,
    session: SessionHandle,
    policy: OwnerPolicy,
    default_owner_password: SecretString,
    page_size: u32,
}

impl<S: RecordStore> ShopService<S> {
    #[must_use]
    pub fn new(store: S, session: SessionHandle, config: &ConsoleConfig) -> Self {
        Self {
            store,
            session,
            policy: config.owner_policy,
            default_owner_password: config.default_owner_password.clone(),
            page_size: config.page_size,
        }
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub const fn policy(&self) -> OwnerPolicy {
        self.policy
    }

    /// Principal of the current session.
    pub(super) fn principal(&self) -> Result<Principal, ShopError> {
        self.session.principal().ok_or(ShopError::NotAuthenticated)
    }

    /// Create a shop, resolving its owner first.
    ///
    /// Exactly one shop create is issued. If it fails after an owner was
    /// provisioned, the new user is left in place.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError`] for validation failures, owner resolution
    /// failures and remote rejections (message passed through verbatim).
    #[instrument(skip(self, new, confirm), fields(name = %new.name))]
    pub async fn create(&self, new: &NewShop, confirm: &dyn Confirm) -> Result<Shop, ShopError> {
        let principal = self.principal()?;
        let name = new.name.trim();
        if name.is_empty() {
            return Err(ShopError::Validation("A shop name is required.".to_owned()));
        }

        let resolution = resolve_owner(
            &self.store,
            &principal,
            self.policy,
            &new.owner_email,
            &self.default_owner_password,
            confirm,
        )
        .await?;

        let owner = resolution
            .owner_id()
            .map_or(Value::Null, |id| Value::String(id.to_string()));
        let body = RecordBody::new()
            .field("name", name)
            .field("commission_rate", serde_json::to_value(new.commission).unwrap_or(Value::Null))
            .field("owner", owner);

        let record = match self.store.create(SHOPS, body).await {
            Ok(record) => record,
            Err(e) => {
                if let OwnerResolution::Provisioned(id) = &resolution {
                    warn!(user = %id, error = %e, "shop create failed after provisioning its owner; user kept");
                }
                return Err(e.into());
            }
        };

        let shop: Shop = decode(record)?;
        info!(shop = %shop.id, owner = ?shop.owner, "shop created");
        Ok(shop)
    }

    /// First page of shops, newest first, with owners expanded.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Store`] if the request fails.
    pub async fn list(&self) -> Result<ListResult<Shop>, ShopError> {
        let query = ListQuery::page(1, self.page_size)
            .sort("-created")
            .expand("owner");
        let page = self.store.list(SHOPS, &query).await?;
        Ok(page.try_map(decode::<Shop>)?)
    }

    /// Shops owned by `user`.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Store`] if the request fails.
    pub async fn list_owned(&self, user: &UserId) -> Result<ListResult<Shop>, ShopError> {
        let query = ListQuery::page(1, self.page_size)
            .filter(filter::eq("owner", user.as_str()))
            .sort("-created");
        let page = self.store.list(SHOPS, &query).await?;
        Ok(page.try_map(decode::<Shop>)?)
    }

    /// Shops the current principal manages: all of them for a superuser,
    /// owned ones for a standard user.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::NotAuthenticated`] or [`ShopError::Store`].
    pub async fn list_visible(&self) -> Result<ListResult<Shop>, ShopError> {
        let principal = self.principal()?;
        if principal.is_superuser() {
            self.list().await
        } else {
            self.list_owned(&principal.id).await
        }
    }

    /// Number of shops the current principal manages.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::NotAuthenticated`] or [`ShopError::Store`].
    pub async fn count(&self) -> Result<u64, ShopError> {
        let principal = self.principal()?;
        let mut query = ListQuery::page(1, 1);
        if !principal.is_superuser() {
            query = query.filter(filter::eq("owner", principal.id.as_str()));
        }
        let page = self.store.list(SHOPS, &query).await?;
        Ok(u64::try_from(page.total_items).unwrap_or_default())
    }

    /// First shop of the list, used as the default product target.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Store`] if the request fails.
    pub async fn first_shop(&self) -> Result<Option<Shop>, ShopError> {
        let page = self.store.list(SHOPS, &ListQuery::page(1, 1)).await?;
        match page.items.into_iter().next() {
            Some(record) => Ok(Some(decode(record)?)),
            None => Ok(None),
        }
    }

    /// Delete a shop. Its products are not deleted.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Store`] if the request fails.
    #[instrument(skip(self), fields(shop = %id))]
    pub async fn delete(&self, id: &ShopId) -> Result<(), ShopError> {
        self.store.delete(SHOPS, id.as_str()).await?;
        info!("shop deleted");
        Ok(())
    }
}
