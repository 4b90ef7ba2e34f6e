//! Principal roles and the auth collections they come from.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Auth collection holding privileged accounts.
pub const SUPERUSER_COLLECTION: &str = "_superusers";

/// Auth collection holding ordinary shop owners.
pub const USER_COLLECTION: &str = "users";

/// Role of the principal acting through the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalRole {
    /// Platform superuser: may create shops on behalf of any owner.
    Superuser,
    /// Ordinary shop owner: owns every shop they create.
    User,
}

impl PrincipalRole {
    /// Classify a principal by the auth collection its record belongs to.
    #[must_use]
    pub fn from_collection_name(collection: &str) -> Self {
        if collection == SUPERUSER_COLLECTION {
            Self::Superuser
        } else {
            Self::User
        }
    }

    /// Auth collection this role authenticates against.
    #[must_use]
    pub const fn collection_name(self) -> &'static str {
        match self {
            Self::Superuser => SUPERUSER_COLLECTION,
            Self::User => USER_COLLECTION,
        }
    }

    /// Whether the role is privileged.
    #[must_use]
    pub const fn is_privileged(self) -> bool {
        matches!(self, Self::Superuser)
    }
}

impl fmt::Display for PrincipalRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Superuser => write!(f, "superuser"),
            Self::User => write!(f, "user"),
        }
    }
}
