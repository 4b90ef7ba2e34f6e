//! Command implementations.
//!
//! Each command takes the shared [`Context`] and writes its result to `out`.

pub mod auth;
pub mod products;
pub mod shops;
pub mod system;

use mercado_admin::config::ConsoleConfig;
use mercado_admin::services::{ProductService, ShopService};
use mercado_admin::session::{Principal, SessionFile, SessionHandle};
use mercado_admin::store::PocketBaseClient;
use tokio::task::JoinHandle;

use crate::error::CliError;

/// Configuration, session and client shared by every command.
pub struct Context {
    pub config: ConsoleConfig,
    pub session: SessionHandle,
    pub client: PocketBaseClient,
    persist: JoinHandle<()>,
}

impl Context {
    /// Load configuration and the stored session, and start mirroring
    /// session changes back to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the client
    /// cannot be built.
    pub async fn load() -> Result<Self, CliError> {
        let config = ConsoleConfig::from_env()?;
        let session = SessionHandle::new();
        let file = SessionFile::new(&config.session_file);

        match file.load().await {
            Ok(Some(stored)) => session.login(stored),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, path = %file.path().display(), "ignoring stored session");
            }
        }

        let persist = tokio::spawn(file.persist_changes(session.subscribe()));
        let client = PocketBaseClient::new(config.api_url.clone(), session.clone())?;

        Ok(Self {
            config,
            session,
            client,
            persist,
        })
    }

    /// Drop every session handle and wait for the last change to be written.
    pub async fn finish(self) {
        let Self {
            config: _,
            session,
            client,
            persist,
        } = self;
        drop(client);
        drop(session);
        if let Err(e) = persist.await {
            tracing::warn!(error = %e, "session writer stopped unexpectedly");
        }
    }

    pub fn principal(&self) -> Result<Principal, CliError> {
        self.session.principal().ok_or(CliError::NotLoggedIn)
    }

    #[must_use]
    pub fn shops(&self) -> ShopService<PocketBaseClient> {
        ShopService::new(self.client.clone(), self.session.clone(), &self.config)
    }

    #[must_use]
    pub fn products(&self) -> ProductService<PocketBaseClient> {
        ProductService::new(self.client.clone(), &self.config)
    }
}
