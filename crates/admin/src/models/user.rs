//! Auth records of the `users` collection.

use mercado_core::UserId;
use serde::{Deserialize, Serialize};

/// A record of the `users` auth collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Empty when the user hides their email from the caller.
    #[serde(default)]
    pub email: String,
}
