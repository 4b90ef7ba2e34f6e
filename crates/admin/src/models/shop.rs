//! Shop records.

use mercado_core::{CommissionRate, ShopId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{User, relation_id};

/// A record of the `shops` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shop {
    pub id: ShopId,
    pub name: String,
    /// Percentage as stored; older records may hold values outside 0 to 100.
    #[serde(default, with = "rust_decimal::serde::float")]
    pub commission_rate: Decimal,
    #[serde(default, deserialize_with = "relation_id")]
    pub owner: Option<UserId>,
    #[serde(default)]
    pub expand: ShopExpand,
    #[serde(default)]
    pub created: String,
}

/// Relations expanded by `expand=owner`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopExpand {
    #[serde(default)]
    pub owner: Option<User>,
}

impl Shop {
    /// Email of the expanded owner, if the owner was expanded and is visible.
    #[must_use]
    pub fn owner_email(&self) -> Option<&str> {
        self.expand
            .owner
            .as_ref()
            .map(|owner| owner.email.as_str())
            .filter(|email| !email.is_empty())
    }

    /// Commission as a validated rate, when the stored value is in range.
    #[must_use]
    pub fn commission(&self) -> Option<CommissionRate> {
        CommissionRate::new(self.commission_rate).ok()
    }

    /// Whether `user` owns this shop.
    #[must_use]
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        self.owner.as_ref() == Some(user)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::store::decode;

    #[test]
    fn test_decode_with_expanded_owner() {
        let record = json!({
            "id": "s1",
            "collectionId": "pbc_shops",
            "collectionName": "shops",
            "name": "Abarrotes Pati",
            "commission_rate": 12.5,
            "owner": "u1",
            "created": "2025-01-01 00:00:01.000Z",
            "expand": {"owner": {"id": "u1", "email": "pati@mercado.test"}}
        });
        let shop: Shop = decode(record.as_object().unwrap().clone()).unwrap();
        assert_eq!(shop.owner, Some(UserId::new("u1")));
        assert_eq!(shop.owner_email(), Some("pati@mercado.test"));
        assert_eq!(shop.commission().unwrap().to_string(), "12.5%");
        assert!(shop.is_owned_by(&UserId::new("u1")));
    }

    #[test]
    fn test_decode_unowned() {
        let record = json!({"id": "s2", "name": "Sin dueño", "owner": ""});
        let shop: Shop = decode(record.as_object().unwrap().clone()).unwrap();
        assert!(shop.owner.is_none());
        assert!(shop.owner_email().is_none());
        assert_eq!(shop.commission_rate, Decimal::ZERO);
    }
}
