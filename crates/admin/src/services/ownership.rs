//! Who owns a newly created shop.
//!
//! A standard user always owns what they create. A superuser names the owner
//! by email, under one of two policies:
//!
//! | Policy | Blank email | Unknown email |
//! |---|---|---|
//! | [`OwnerPolicy::OptionalOwner`] | shop has no owner | abort: create the user first |
//! | [`OwnerPolicy::MandatoryOwnerAutocreate`] | abort before any call | confirm, then provision the user |
//!
//! Provisioned users get the configured default password. Lookup and
//! provisioning are not transactional with the shop create that follows.

use core::fmt;
use std::str::FromStr;

use mercado_core::{Email, PrincipalRole, UserId};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{info, instrument};

use super::shops::ShopError;
use crate::session::Principal;
use crate::store::{RecordBody, RecordStore, StoreError, USERS, filter};

/// How a superuser assigns the owner of a new shop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum OwnerPolicy {
    /// Owner email may be blank; unknown emails abort.
    OptionalOwner,
    /// Owner email is required; unknown emails provision a new user.
    #[default]
    MandatoryOwnerAutocreate,
}

impl fmt::Display for OwnerPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OptionalOwner => write!(f, "optional"),
            Self::MandatoryOwnerAutocreate => write!(f, "mandatory-autocreate"),
        }
    }
}

impl FromStr for OwnerPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "optional" | "optional-owner" => Ok(Self::OptionalOwner),
            "mandatory-autocreate" | "mandatory" | "autocreate" => {
                Ok(Self::MandatoryOwnerAutocreate)
            }
            other => Err(format!(
                "unknown owner policy '{other}' (expected 'optional' or 'mandatory-autocreate')"
            )),
        }
    }
}

/// Asks the operator a yes/no question.
pub trait Confirm: Send + Sync {
    /// Return `true` to proceed.
    fn confirm(&self, prompt: &str) -> bool;
}

/// Answers yes to everything (`--yes`).
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Answers no to everything (non-interactive runs).
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverConfirm;

impl Confirm for NeverConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}

/// Outcome of owner resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerResolution {
    /// Standard user: the acting principal.
    Principal(UserId),
    /// Superuser: an existing user found by email.
    Existing(UserId),
    /// Superuser: a user provisioned for this shop.
    Provisioned(UserId),
    /// Superuser under the optional policy with a blank email.
    NoOwner,
}

impl OwnerResolution {
    /// Owner to write on the shop record.
    #[must_use]
    pub const fn owner_id(&self) -> Option<&UserId> {
        match self {
            Self::Principal(id) | Self::Existing(id) | Self::Provisioned(id) => Some(id),
            Self::NoOwner => None,
        }
    }
}

/// Decide the owner of a new shop.
///
/// Standard users resolve to themselves without any remote call and the
/// email is ignored.
///
/// # Errors
///
/// - [`ShopError::Validation`] when the mandatory policy gets a blank email
/// - [`ShopError::InvalidEmail`] when the email is malformed
/// - [`ShopError::OwnerNotFound`] when the optional policy misses
/// - [`ShopError::ProvisionDeclined`] when the operator declines provisioning
/// - [`ShopError::Store`] when a lookup or the user create fails
#[instrument(skip(store, principal, default_password, confirm), fields(role = %principal.role))]
pub async fn resolve_owner<S>(
    store: &S,
    principal: &Principal,
    policy: OwnerPolicy,
    owner_email: &str,
    default_password: &SecretString,
    confirm: &dyn Confirm,
) -> Result<OwnerResolution, ShopError>
where
    S: RecordStore + ?Sized,
{
    if principal.role == PrincipalRole::User {
        return Ok(OwnerResolution::Principal(principal.id.clone()));
    }

    let Some(email) = Email::parse_optional(owner_email)? else {
        return match policy {
            OwnerPolicy::OptionalOwner => Ok(OwnerResolution::NoOwner),
            OwnerPolicy::MandatoryOwnerAutocreate => Err(ShopError::Validation(
                "An owner email is required.".to_owned(),
            )),
        };
    };

    match store.get_first(USERS, &filter::eq("email", email.as_str())).await {
        Ok(record) => Ok(OwnerResolution::Existing(record_id(&record)?)),
        Err(StoreError::NotFound(_)) => match policy {
            OwnerPolicy::OptionalOwner => Err(ShopError::OwnerNotFound(email.into_inner())),
            OwnerPolicy::MandatoryOwnerAutocreate => {
                let prompt = format!(
                    "No user with email {email} exists. Create it with the default password?"
                );
                if !confirm.confirm(&prompt) {
                    return Err(ShopError::ProvisionDeclined(email.into_inner()));
                }
                let id = provision_user(store, &email, default_password).await?;
                Ok(OwnerResolution::Provisioned(id))
            }
        },
        Err(e) => Err(e.into()),
    }
}

/// Create a `users` record with the default password.
async fn provision_user<S>(
    store: &S,
    email: &Email,
    password: &SecretString,
) -> Result<UserId, ShopError>
where
    S: RecordStore + ?Sized,
{
    let body = RecordBody::new()
        .field("email", email.as_str())
        .field("password", password.expose_secret())
        .field("passwordConfirm", password.expose_secret())
        .field("emailVisibility", true);
    let record = store.create(USERS, body).await?;
    let id = record_id(&record)?;
    info!(user = %id, email = %email, "provisioned shop owner");
    Ok(id)
}

fn record_id(record: &crate::store::Record) -> Result<UserId, ShopError> {
    record
        .get("id")
        .and_then(Value::as_str)
        .map(UserId::new)
        .ok_or_else(|| ShopError::Store(StoreError::Parse("record has no id".to_owned())))
}
