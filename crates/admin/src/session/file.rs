//! On-disk session persistence for the CLI.

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::watch;

use super::{AuthSession, Principal, SessionError};

/// Owner-only access for the session file and its directory.
#[cfg(unix)]
const FILE_MODE: u32 = 0o600;
#[cfg(unix)]
const DIR_MODE: u32 = 0o700;

#[derive(Serialize, Deserialize)]
struct StoredSession {
    token: String,
    principal: Principal,
}

/// A JSON file holding the last session.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored session.
    ///
    /// A missing file or an expired token reads as `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(&self) -> Result<Option<AuthSession>, SessionError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let stored: StoredSession = serde_json::from_slice(&bytes)?;
        let session = AuthSession::new(SecretString::from(stored.token), stored.principal);

        if !session.is_valid_at(Utc::now()) {
            tracing::info!(path = %self.path.display(), "stored session has expired");
            return Ok(None);
        }
        Ok(Some(session))
    }

    /// Write `session`, creating parent directories as needed.
    ///
    /// The file holds a bearer token, so on unix it is readable by its owner
    /// only (`0600`) and new directories get `0700`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save(&self, session: &AuthSession) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            let mut dirs = tokio::fs::DirBuilder::new();
            dirs.recursive(true);
            #[cfg(unix)]
            dirs.mode(DIR_MODE);
            dirs.create(parent).await?;
        }
        let stored = StoredSession {
            token: session.token().expose_secret().to_owned(),
            principal: session.principal().clone(),
        };
        write_private(&self.path, &serde_json::to_vec_pretty(&stored)?).await?;
        tracing::debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    /// Remove the file. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub async fn clear(&self) -> Result<(), SessionError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Mirror every change on `rx` to disk until the sender is dropped.
    pub async fn persist_changes(self, mut rx: watch::Receiver<Option<AuthSession>>) {
        while rx.changed().await.is_ok() {
            let current = rx.borrow_and_update().clone();
            let result = match current {
                Some(session) => self.save(&session).await,
                None => self.clear().await,
            };
            if let Err(e) = result {
                tracing::warn!(error = %e, path = %self.path.display(), "failed to persist session");
            }
        }
    }
}

/// Truncate and write `bytes`, restricting an existing file's mode too.
async fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(FILE_MODE);
    let mut file = options.open(path).await?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(FILE_MODE))
            .await?;
    }
    file.write_all(bytes).await?;
    file.flush().await
}
