//! Authenticated session state.
//!
//! [`SessionHandle`] is the single source of truth for "who is logged in".
//! The HTTP client reads the bearer token from it on every request and
//! long-lived consumers subscribe to changes instead of polling.

mod file;

pub use file::SessionFile;

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use mercado_core::{PrincipalRole, UserId};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::watch;

/// Errors from reading or persisting a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Auth response or stored session is malformed.
    #[error("invalid session: {0}")]
    Invalid(String),

    /// Session file could not be read or written.
    #[error("session file error: {0}")]
    Io(#[from] std::io::Error),

    /// Session file is not valid JSON.
    #[error("session file is corrupt: {0}")]
    Json(#[from] serde_json::Error),
}

/// The authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub email: String,
    pub role: PrincipalRole,
}

impl Principal {
    /// Build a principal from an auth record (`id`, `email`, `collectionName`).
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Invalid`] if `id` or `collectionName` is missing.
    pub fn from_record(record: &Value) -> Result<Self, SessionError> {
        let id = record
            .get("id")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SessionError::Invalid("auth record has no id".to_owned()))?;
        let collection = record
            .get("collectionName")
            .and_then(Value::as_str)
            .ok_or_else(|| SessionError::Invalid("auth record has no collectionName".to_owned()))?;
        let role = PrincipalRole::from_collection_name(collection);
        let email = record
            .get("email")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();

        Ok(Self {
            id: UserId::new(id),
            email,
            role,
        })
    }

    /// Whether this principal may act across all shops.
    #[must_use]
    pub const fn is_superuser(&self) -> bool {
        self.role.is_privileged()
    }
}

/// A logged-in session: bearer token plus principal.
#[derive(Clone)]
pub struct AuthSession {
    token: SecretString,
    principal: Principal,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("token", &"[REDACTED]")
            .field("principal", &self.principal)
            .finish()
    }
}

impl AuthSession {
    #[must_use]
    pub const fn new(token: SecretString, principal: Principal) -> Self {
        Self { token, principal }
    }

    /// Parse an `auth-with-password` response: `{"token": ..., "record": {...}}`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Invalid`] if the token or record is missing.
    pub fn from_auth_response(response: &Value) -> Result<Self, SessionError> {
        let token = response
            .get("token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SessionError::Invalid("auth response has no token".to_owned()))?;
        let record = response
            .get("record")
            .ok_or_else(|| SessionError::Invalid("auth response has no record".to_owned()))?;

        Ok(Self {
            token: SecretString::from(token),
            principal: Principal::from_record(record)?,
        })
    }

    #[must_use]
    pub const fn token(&self) -> &SecretString {
        &self.token
    }

    #[must_use]
    pub const fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Expiry encoded in the token's `exp` claim, if readable.
    ///
    /// The signature is not checked; the service does that.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let payload = self.token.expose_secret().split('.').nth(1)?;
        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
        let claims: Value = serde_json::from_slice(&bytes).ok()?;
        let exp = claims.get("exp")?.as_i64()?;
        DateTime::from_timestamp(exp, 0)
    }

    /// Whether the token is unexpired at `now`. Tokens without a readable
    /// expiry are treated as valid and left for the service to reject.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_none_or(|exp| exp > now)
    }
}

/// Shared, observable session slot.
#[derive(Clone)]
pub struct SessionHandle {
    tx: Arc<watch::Sender<Option<AuthSession>>>,
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("principal", &self.principal())
            .finish()
    }
}

impl SessionHandle {
    /// An empty (logged out) handle.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// A handle already holding `session`.
    #[must_use]
    pub fn with_session(session: AuthSession) -> Self {
        let handle = Self::new();
        handle.login(session);
        handle
    }

    /// Replace the current session and notify subscribers.
    pub fn login(&self, session: AuthSession) {
        tracing::debug!(user = %session.principal.id, role = %session.principal.role, "session started");
        self.tx.send_replace(Some(session));
    }

    /// Clear the session and notify subscribers.
    pub fn logout(&self) {
        if self.tx.send_replace(None).is_some() {
            tracing::debug!("session cleared");
        }
    }

    /// Snapshot of the current session.
    #[must_use]
    pub fn current(&self) -> Option<AuthSession> {
        self.tx.borrow().clone()
    }

    #[must_use]
    pub fn principal(&self) -> Option<Principal> {
        self.tx.borrow().as_ref().map(|s| s.principal.clone())
    }

    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.tx.borrow().as_ref().map(|s| s.token.clone())
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Receive every future login and logout.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<AuthSession>> {
        self.tx.subscribe()
    }
}
