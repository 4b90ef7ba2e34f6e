//! Shop commands.

use std::io::Write;

use mercado_admin::forms::ShopForm;
use mercado_admin::services::{AlwaysConfirm, Confirm};
use mercado_core::{CommissionRate, ShopId};

use super::Context;
use crate::confirm::StdinConfirm;
use crate::error::CliError;
use crate::views;

pub async fn list(ctx: &Context, out: &mut impl Write) -> Result<(), CliError> {
    let page = ctx.shops().list().await?;
    views::shops(out, &page.items)?;
    Ok(())
}

/// Shops owned by the logged-in user.
pub async fn mine(ctx: &Context, out: &mut impl Write) -> Result<(), CliError> {
    let principal = ctx.principal()?;
    let page = ctx.shops().list_owned(&principal.id).await?;
    views::shops(out, &page.items)?;
    Ok(())
}

/// Create a shop, then show the refreshed list.
///
/// With `yes`, an unknown owner is provisioned without asking.
pub async fn create(
    ctx: &Context,
    out: &mut impl Write,
    name: String,
    commission: &str,
    owner: String,
    yes: bool,
) -> Result<(), CliError> {
    let mut form = ShopForm {
        name,
        commission: commission.parse::<CommissionRate>()?,
        owner_email: owner,
    };
    let confirm: &dyn Confirm = if yes { &AlwaysConfirm } else { &StdinConfirm };

    let shops = ctx.shops();
    let shop = form.submit(&shops, confirm).await?;
    views::shop_created(out, &shop)?;
    views::shops(out, &shops.list().await?.items)?;
    Ok(())
}

/// Delete a shop after confirmation, then show the refreshed list.
pub async fn delete(ctx: &Context, out: &mut impl Write, id: &str, yes: bool) -> Result<(), CliError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(CliError::Input("A shop ID is required.".to_owned()));
    }
    if !yes && !StdinConfirm.confirm(&format!("Delete shop {id}?")) {
        views::cancelled(out)?;
        return Ok(());
    }

    let shops = ctx.shops();
    shops.delete(&ShopId::new(id)).await?;
    views::shop_deleted(out, id)?;
    views::shops(out, &shops.list().await?.items)?;
    Ok(())
}
