//! Remote data service contract.
//!
//! The console never talks to the backend except through [`RecordStore`]:
//! named collections of JSON records with create, update, filtered listing,
//! first-match lookup, delete and file URLs. [`PocketBaseClient`] implements
//! it over HTTP; [`MemoryStore`] implements it in memory for tests.
//!
//! # Collections
//!
//! | Collection | Holds |
//! |---|---|
//! | `users` | shop owners (auth collection) |
//! | `_superusers` | platform superusers (auth collection) |
//! | `shops` | `name`, `commission_rate`, `owner` relation |
//! | `products` | `name`, `price`, `shop` relation, `image` file, `group_prices` JSON |

pub mod filter;
#[cfg(any(test, feature = "test-support"))]
mod memory;
mod pocketbase;
mod types;

#[cfg(any(test, feature = "test-support"))]
pub use memory::{MemoryStore, StoreCall, StoreOp};
pub use pocketbase::PocketBaseClient;
pub use types::{FileUpload, ListQuery, ListResult, Record, RecordBody, file_url};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::error::ErrorKind;

/// Collection of shop owners.
pub const USERS: &str = mercado_core::USER_COLLECTION;
/// Collection of shops.
pub const SHOPS: &str = "shops";
/// Collection of products.
pub const PRODUCTS: &str = "products";

/// Errors returned by a [`RecordStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service rejected the request.
    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        /// Per-field validation details, when the service sends them.
        data: Value,
    },

    /// Record or collection not found (also: a first-match lookup with no match).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or rejected credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Response body could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl StoreError {
    /// Classify the failure for reporting.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Api { .. } | Self::NotFound(_) | Self::Unauthorized(_) => {
                ErrorKind::RemoteRejection
            }
            Self::Http(_) | Self::Parse(_) | Self::Url(_) => ErrorKind::Network,
        }
    }

    /// Whether this is a not-found condition.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Remote data service capabilities used by the console.
///
/// Requests are fire-and-await: no retries, no caching, no local timeouts.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Create a record. A body with files is sent as multipart.
    async fn create(&self, collection: &str, body: RecordBody) -> Result<Record, StoreError>;

    /// Replace fields of an existing record.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        body: RecordBody,
    ) -> Result<Record, StoreError>;

    /// List one page of records.
    async fn list(&self, collection: &str, query: &ListQuery)
    -> Result<ListResult<Record>, StoreError>;

    /// Delete a record.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Public URL of a file stored on `record`, or `None` if the file field is empty.
    fn file_url(&self, record: &Record, field: &str) -> Option<String>;

    /// First record matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when nothing matches.
    async fn get_first(&self, collection: &str, filter: &str) -> Result<Record, StoreError> {
        let query = ListQuery::first().filter(filter);
        let page = self.list(collection, &query).await?;
        page.items
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(format!("no {collection} record matches {filter}")))
    }
}

/// Out-of-contract repair of a backend whose collections are missing.
#[async_trait]
pub trait SchemaRepair: Send + Sync {
    /// Ask the backend to (re)import its collections; returns its message.
    async fn repair_schema(&self) -> Result<String, StoreError>;
}

/// Decode a raw record into a typed model.
///
/// # Errors
///
/// Returns [`StoreError::Parse`] if the record does not match `T`.
pub fn decode<T: DeserializeOwned>(record: Record) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(record)).map_err(|e| StoreError::Parse(e.to_string()))
}
