//! Shop creation form.

use mercado_core::CommissionRate;

use crate::models::Shop;
use crate::services::{Confirm, NewShop, ShopError, ShopService};
use crate::store::RecordStore;

/// The "new shop" form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShopForm {
    pub name: String,
    pub commission: CommissionRate,
    /// Only shown to superusers.
    pub owner_email: String,
}

impl ShopForm {
    /// Create the shop. Name and owner email are cleared on success; the
    /// commission is kept for the next shop.
    ///
    /// # Errors
    ///
    /// Returns the [`ShopError`] of the create; the form is left untouched.
    pub async fn submit<S: RecordStore>(
        &mut self,
        shops: &ShopService<S>,
        confirm: &dyn Confirm,
    ) -> Result<Shop, ShopError> {
        let new = NewShop {
            name: self.name.clone(),
            commission: self.commission,
            owner_email: self.owner_email.clone(),
        };
        let shop = shops.create(&new, confirm).await?;
        self.name.clear();
        self.owner_email.clear();
        Ok(shop)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mercado_core::{PrincipalRole, UserId};
    use rust_decimal::Decimal;
    use secrecy::SecretString;

    use super::*;
    use crate::config::ConsoleConfig;
    use crate::services::{AlwaysConfirm, OwnerPolicy};
    use crate::session::{AuthSession, Principal, SessionHandle};
    use crate::store::{MemoryStore, SHOPS, StoreOp};

    fn superuser_shops(store: &MemoryStore) -> ShopService<MemoryStore> {
        let session = SessionHandle::with_session(AuthSession::new(
            SecretString::from("t"),
            Principal {
                id: UserId::new("root"),
                email: "admin@pati.com".to_owned(),
                role: PrincipalRole::Superuser,
            },
        ));
        let config = ConsoleConfig {
            owner_policy: OwnerPolicy::MandatoryOwnerAutocreate,
            ..ConsoleConfig::default()
        };
        ShopService::new(store.clone(), session, &config)
    }

    #[test]
    fn test_default_commission() {
        assert_eq!(ShopForm::default().commission.percent(), Decimal::from(10));
    }

    #[tokio::test]
    async fn test_success_clears_name_and_email() {
        let store = MemoryStore::new();
        let mut form = ShopForm {
            name: "Abarrotes".to_owned(),
            commission: CommissionRate::new(Decimal::from(7)).unwrap(),
            owner_email: "o@x.co".to_owned(),
        };
        form.submit(&superuser_shops(&store), &AlwaysConfirm).await.unwrap();
        assert!(form.name.is_empty());
        assert!(form.owner_email.is_empty());
        assert_eq!(form.commission.percent(), Decimal::from(7));
    }

    #[tokio::test]
    async fn test_failure_keeps_state() {
        let store = MemoryStore::new();
        store.fail_next(StoreOp::Create, SHOPS, "Failed to create record.");
        let mut form = ShopForm {
            name: "Abarrotes".to_owned(),
            owner_email: "o@x.co".to_owned(),
            ..ShopForm::default()
        };
        let before = form.clone();
        assert!(form.submit(&superuser_shops(&store), &AlwaysConfirm).await.is_err());
        assert_eq!(form, before);
    }

    #[tokio::test]
    async fn test_blank_email_keeps_state() {
        let store = MemoryStore::new();
        let mut form = ShopForm {
            name: "Abarrotes".to_owned(),
            ..ShopForm::default()
        };
        let before = form.clone();
        assert!(form.submit(&superuser_shops(&store), &AlwaysConfirm).await.is_err());
        assert_eq!(form, before);
        assert!(store.calls().is_empty());
    }
}
