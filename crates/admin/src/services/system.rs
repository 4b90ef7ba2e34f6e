//! Backend schema check.
//!
//! A backend whose collections were never imported answers 404 for
//! `shops`. The check then asks the backend to re-import its schema through a
//! diagnostic endpoint that sits outside the record contract.

use tracing::{error, info, instrument};

use crate::store::{ListQuery, RecordStore, SHOPS, SchemaRepair, StoreError};

/// Outcome of [`SystemCheck::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemStatus {
    /// `shops` is reachable.
    Healthy { shops: i64 },
    /// `shops` was missing and the repair succeeded.
    Repaired { message: String },
    /// `shops` was missing and the repair failed.
    RepairFailed { error: String },
}

/// Checks that the backend schema is in place.
#[derive(Debug, Clone)]
pub struct SystemCheck<S> {
    store: S,
}

impl<S: RecordStore + SchemaRepair> SystemCheck<S> {
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// List `shops`; on a 404 request a schema repair.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] for failures other than a missing collection.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<SystemStatus, StoreError> {
        match self.store.list(SHOPS, &ListQuery::page(1, 1)).await {
            Ok(page) => Ok(SystemStatus::Healthy {
                shops: page.total_items,
            }),
            Err(StoreError::NotFound(reason)) => {
                info!(%reason, "shops collection missing; requesting schema repair");
                match self.store.repair_schema().await {
                    Ok(message) => Ok(SystemStatus::Repaired { message }),
                    Err(e) => {
                        error!(error = %e, "schema repair failed");
                        Ok(SystemStatus::RepairFailed {
                            error: e.to_string(),
                        })
                    }
                }
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::store::{MemoryStore, StoreOp};

    #[tokio::test]
    async fn test_healthy() {
        let store = MemoryStore::new();
        let _ = store.insert(SHOPS, json!({"name": "A"}));
        let status = SystemCheck::new(store.clone()).run().await.unwrap();
        assert_eq!(status, SystemStatus::Healthy { shops: 1 });
        assert!(store.calls_of(StoreOp::RepairSchema).is_empty());
    }

    #[tokio::test]
    async fn test_missing_schema_is_repaired() {
        let store = MemoryStore::without_schema();
        let status = SystemCheck::new(store.clone()).run().await.unwrap();
        assert!(matches!(status, SystemStatus::Repaired { .. }));
        assert_eq!(
            SystemCheck::new(store).run().await.unwrap(),
            SystemStatus::Healthy { shops: 0 }
        );
    }

    #[tokio::test]
    async fn test_repair_failure_is_reported() {
        let store = MemoryStore::without_schema();
        store.fail_next(StoreOp::RepairSchema, "", "schema file not found");
        let status = SystemCheck::new(store).run().await.unwrap();
        assert_eq!(
            status,
            SystemStatus::RepairFailed {
                error: "schema file not found".to_owned()
            }
        );
    }

    #[tokio::test]
    async fn test_other_errors_propagate() {
        let store = MemoryStore::new();
        store.fail_next(StoreOp::List, SHOPS, "Something went wrong.");
        assert!(SystemCheck::new(store).run().await.is_err());
    }
}
