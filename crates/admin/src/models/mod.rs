//! Typed views of the records the console works with.
//!
//! Records are decoded with [`crate::store::decode`]. Unknown fields are
//! ignored, so a backend with extra columns still decodes.

mod product;
mod shop;
mod user;

pub use product::Product;
pub use shop::{Shop, ShopExpand};
pub use user::User;

use serde::{Deserialize, Deserializer};

/// Decode a relation field; the service sends `""` for an unset relation.
pub(crate) fn relation_id<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: From<String>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|id| !id.is_empty()).map(T::from))
}
