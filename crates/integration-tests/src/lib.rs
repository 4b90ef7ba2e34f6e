//! Integration tests for the Mercado PaTi console.
//!
//! The tests drive the services, forms and system check end to end against
//! [`MemoryStore`], which records every call so tests can assert how many
//! remote requests an operation issued.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p mercado-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `shop_ownership` - owner resolution under each policy and role
//! - `shop_listing` - listing, counting, deletion and the dashboard
//! - `products` - product creation, tiers, images and tier migration
//! - `system_check` - schema verification and repair

use mercado_admin::config::ConsoleConfig;
use mercado_admin::services::{OwnerPolicy, ProductService, ShopService};
use mercado_admin::session::{AuthSession, Principal, SessionHandle};
use mercado_admin::store::MemoryStore;
use mercado_core::{PrincipalRole, UserId};
use secrecy::SecretString;
use serde_json::json;

pub use mercado_admin::store::{StoreCall, StoreOp};

/// Superuser used across tests.
pub const ADMIN_EMAIL: &str = "admin@pati.com";

/// Store, session and configuration for one test.
pub struct TestContext {
    pub store: MemoryStore,
    pub session: SessionHandle,
    pub config: ConsoleConfig,
}

impl TestContext {
    /// Logged in as the platform superuser, mandatory owner policy.
    #[must_use]
    pub fn superuser() -> Self {
        Self::with(
            MemoryStore::new(),
            principal("root", ADMIN_EMAIL, PrincipalRole::Superuser),
            OwnerPolicy::MandatoryOwnerAutocreate,
        )
    }

    /// Logged in as a shop owner whose user record is seeded.
    #[must_use]
    pub fn owner(email: &str) -> Self {
        let store = MemoryStore::new();
        let user = store.insert("users", json!({ "email": email, "password": "secret-pass" }));
        let id = user
            .get("id")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_owned();
        Self::with(
            store,
            principal(&id, email, PrincipalRole::User),
            OwnerPolicy::MandatoryOwnerAutocreate,
        )
    }

    #[must_use]
    pub fn with(store: MemoryStore, principal: Principal, policy: OwnerPolicy) -> Self {
        let session =
            SessionHandle::with_session(AuthSession::new(SecretString::from("test-token"), principal));
        let config = ConsoleConfig {
            owner_policy: policy,
            ..ConsoleConfig::default()
        };
        Self {
            store,
            session,
            config,
        }
    }

    /// Switch the owner policy.
    #[must_use]
    pub fn policy(mut self, policy: OwnerPolicy) -> Self {
        self.config.owner_policy = policy;
        self
    }

    #[must_use]
    pub fn shops(&self) -> ShopService<MemoryStore> {
        ShopService::new(self.store.clone(), self.session.clone(), &self.config)
    }

    #[must_use]
    pub fn products(&self) -> ProductService<MemoryStore> {
        ProductService::new(self.store.clone(), &self.config)
    }

    /// The logged-in principal.
    ///
    /// # Panics
    ///
    /// Panics if the session was logged out.
    #[must_use]
    pub fn principal(&self) -> Principal {
        self.session.principal().expect("test session is logged in")
    }

    /// Collections of every recorded call of `op`, in order.
    #[must_use]
    pub fn collections_of(&self, op: StoreOp) -> Vec<String> {
        self.store
            .calls_of(op)
            .into_iter()
            .map(|call| call.collection)
            .collect()
    }
}

#[must_use]
pub fn principal(id: &str, email: &str, role: PrincipalRole) -> Principal {
    Principal {
        id: UserId::new(id),
        email: email.to_owned(),
        role,
    }
}
