//! Listing, counting and deleting shops, and the dashboard built on them.

#![allow(clippy::unwrap_used)]

use mercado_admin::services::{AlwaysConfirm, Dashboard, NewShop};
use mercado_core::{Price, ShopId};
use mercado_integration_tests::{StoreOp, TestContext};
use serde_json::json;

async fn create(ctx: &TestContext, name: &str, owner_email: &str) -> ShopId {
    let new = NewShop {
        name: name.to_owned(),
        owner_email: owner_email.to_owned(),
        ..NewShop::default()
    };
    ctx.shops().create(&new, &AlwaysConfirm).await.unwrap().id
}

#[tokio::test]
async fn test_list_is_newest_first_with_owner_emails() {
    let ctx = TestContext::superuser();
    create(&ctx, "Primera", "uno@pati.com").await;
    create(&ctx, "Segunda", "dos@pati.com").await;

    let page = ctx.shops().list().await.unwrap();

    let names: Vec<_> = page.items.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["Segunda", "Primera"]);
    assert_eq!(page.items[0].owner_email(), Some("dos@pati.com"));
    assert_eq!(page.items[1].owner_email(), Some("uno@pati.com"));
    assert_eq!(page.total_items, 2);
}

#[tokio::test]
async fn test_delete_then_list_is_empty() {
    let ctx = TestContext::superuser();
    let id = create(&ctx, "Temporal", "o@pati.com").await;
    let shops = ctx.shops();

    shops.delete(&id).await.unwrap();

    let page = shops.list().await.unwrap();
    assert!(page.is_empty());
    assert!(shops.first_shop().await.unwrap().is_none());
    // The owner account outlives its shop.
    assert_eq!(ctx.store.records("users").len(), 1);
}

#[tokio::test]
async fn test_delete_keeps_products() {
    let ctx = TestContext::superuser();
    let id = create(&ctx, "Temporal", "o@pati.com").await;
    let _ = ctx
        .store
        .insert("products", json!({"name": "Refresco", "price": 18, "shop": id.as_str()}));

    ctx.shops().delete(&id).await.unwrap();

    assert_eq!(ctx.store.records("products").len(), 1);
}

#[tokio::test]
async fn test_delete_unknown_shop_is_not_found() {
    let ctx = TestContext::superuser();
    let err = ctx.shops().delete(&ShopId::new("missing")).await.unwrap_err();
    assert_eq!(err.kind(), mercado_admin::ErrorKind::RemoteRejection);
    assert_eq!(ctx.collections_of(StoreOp::Delete), ["shops"]);
}

#[tokio::test]
async fn test_counts_follow_the_principal() {
    let ctx = TestContext::owner("duena@pati.com");
    let me = ctx.principal();
    let _ = ctx.store.insert(
        "shops",
        json!({"name": "Ajena", "commission_rate": 10, "owner": "someone-else"}),
    );
    create(&ctx, "Propia", "").await;

    assert_eq!(ctx.shops().count().await.unwrap(), 1);
    let owned = ctx.shops().list_owned(&me.id).await.unwrap();
    assert_eq!(owned.items.len(), 1);
    assert_eq!(owned.items[0].name, "Propia");

    let visible = ctx.shops().list_visible().await.unwrap();
    assert_eq!(visible.items.len(), 1);
}

#[tokio::test]
async fn test_superuser_dashboard_counts_every_shop() {
    let ctx = TestContext::superuser();
    create(&ctx, "Una", "uno@pati.com").await;
    create(&ctx, "Otra", "dos@pati.com").await;
    let shops = ctx.shops();

    let summary = Dashboard::new(&shops).summary().await.unwrap();

    assert_eq!(summary.active_shops, 2);
    assert_eq!(summary.monthly_sales, Price::ZERO);
    assert!(summary.my_shops.is_empty());
}

#[tokio::test]
async fn test_owner_dashboard_lists_own_shops() {
    let ctx = TestContext::owner("duena@pati.com");
    create(&ctx, "Propia", "").await;
    let shops = ctx.shops();

    let summary = Dashboard::new(&shops).summary().await.unwrap();

    assert_eq!(summary.active_shops, 1);
    assert_eq!(summary.my_shops.len(), 1);
    assert_eq!(summary.my_shops[0].name, "Propia");
}
