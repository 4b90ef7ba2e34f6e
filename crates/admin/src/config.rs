//! Console configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `MERCADO_API_URL` - Base URL of the remote data service (default: `http://127.0.0.1:8090`)
//! - `MERCADO_OWNER_POLICY` - Owner policy for superuser shop creation:
//!   `mandatory-autocreate` (default) or `optional`
//! - `MERCADO_DEFAULT_OWNER_PASSWORD` - Password given to auto-provisioned
//!   owners (default: `1234567890`)
//! - `MERCADO_PAGE_SIZE` - Records per list page (default: 50, max 500)
//! - `MERCADO_SESSION_FILE` - Where the CLI keeps its session
//!   (default: `$HOME/.mercado/session.json`)

use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::services::OwnerPolicy;

const DEFAULT_API_URL: &str = "http://127.0.0.1:8090";
const DEFAULT_OWNER_PASSWORD: &str = "1234567890";
const DEFAULT_PAGE_SIZE: u32 = 50;
/// PocketBase rejects `perPage` above this.
const MAX_PAGE_SIZE: u32 = 500;
/// PocketBase's minimum password length for auth records.
const MIN_OWNER_PASSWORD_LENGTH: usize = 8;
const DEFAULT_SESSION_FILE: &str = ".mercado/session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Console configuration.
#[derive(Clone)]
pub struct ConsoleConfig {
    /// Base URL of the remote data service
    pub api_url: Url,
    /// How superusers pick the owner of a new shop
    pub owner_policy: OwnerPolicy,
    /// Password for auto-provisioned owners
    pub default_owner_password: SecretString,
    /// Records per list page
    pub page_size: u32,
    /// Session persistence file
    pub session_file: PathBuf,
}

impl std::fmt::Debug for ConsoleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleConfig")
            .field("api_url", &self.api_url.as_str())
            .field("owner_policy", &self.owner_policy)
            .field("default_owner_password", &"[REDACTED]")
            .field("page_size", &self.page_size)
            .field("session_file", &self.session_file)
            .finish()
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        // DEFAULT_API_URL is a constant absolute http URL, so parsing cannot fail.
        #[allow(clippy::expect_used)]
        let api_url = Url::parse(DEFAULT_API_URL).expect("DEFAULT_API_URL is an absolute URL");
        Self {
            api_url,
            owner_policy: OwnerPolicy::default(),
            default_owner_password: SecretString::from(DEFAULT_OWNER_PASSWORD),
            page_size: DEFAULT_PAGE_SIZE,
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
        }
    }
}

impl ConsoleConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = parse_api_url(&get_or_default(&lookup, "MERCADO_API_URL", DEFAULT_API_URL))?;

        let owner_policy = get_or_default(&lookup, "MERCADO_OWNER_POLICY", "mandatory-autocreate")
            .parse::<OwnerPolicy>()
            .map_err(|e| ConfigError::InvalidEnvVar("MERCADO_OWNER_POLICY".to_string(), e))?;

        let password = get_or_default(
            &lookup,
            "MERCADO_DEFAULT_OWNER_PASSWORD",
            DEFAULT_OWNER_PASSWORD,
        );
        if password.chars().count() < MIN_OWNER_PASSWORD_LENGTH {
            return Err(ConfigError::InvalidEnvVar(
                "MERCADO_DEFAULT_OWNER_PASSWORD".to_string(),
                format!("must be at least {MIN_OWNER_PASSWORD_LENGTH} characters"),
            ));
        }

        let page_size = get_or_default(&lookup, "MERCADO_PAGE_SIZE", "50")
            .parse::<u32>()
            .map_err(|e| ConfigError::InvalidEnvVar("MERCADO_PAGE_SIZE".to_string(), e.to_string()))?;
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidEnvVar(
                "MERCADO_PAGE_SIZE".to_string(),
                format!("must be between 1 and {MAX_PAGE_SIZE}"),
            ));
        }

        let session_file = lookup("MERCADO_SESSION_FILE").map_or_else(
            || default_session_file(lookup("HOME")),
            PathBuf::from,
        );

        Ok(Self {
            api_url,
            owner_policy,
            default_owner_password: SecretString::from(password),
            page_size,
            session_file,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a variable with a default value.
fn get_or_default<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Parse the service URL; only http(s) is accepted.
fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar("MERCADO_API_URL".to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "MERCADO_API_URL".to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

fn default_session_file(home: Option<String>) -> PathBuf {
    home.map_or_else(
        || PathBuf::from(DEFAULT_SESSION_FILE),
        |home| PathBuf::from(home).join(DEFAULT_SESSION_FILE),
    )
}
