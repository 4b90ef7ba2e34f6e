//! Product commands.

use std::io::Write;
use std::path::PathBuf;

use mercado_admin::forms::{ProductForm, TierEditor};
use mercado_admin::store::FileUpload;
use mercado_core::{
    FlatTier, FlatTierField, GroupPrice, GroupPriceField, Price, ShopId, TierForm,
};

use super::Context;
use crate::error::CliError;
use crate::views;

/// Arguments of `products create`.
#[derive(Debug, Default)]
pub struct CreateInput {
    pub shop: Option<String>,
    pub name: String,
    pub price: String,
    pub image: Option<PathBuf>,
    /// `NAME:UNITS:UNIT_PRICE:MIN_QTY`
    pub tiers: Vec<String>,
    /// `NAME=PRICE`
    pub flat: Vec<String>,
}

/// The given shop, or the first one when none is given.
async fn target_shop(ctx: &Context, shop: Option<&str>) -> Result<Option<ShopId>, CliError> {
    match shop.map(str::trim).filter(|s| !s.is_empty()) {
        Some(id) => Ok(Some(ShopId::new(id))),
        None => {
            let first = ctx.shops().first_shop().await?;
            if let Some(shop) = &first {
                tracing::debug!(shop = %shop.id, "defaulting to the first shop");
            }
            Ok(first.map(|shop| shop.id))
        }
    }
}

pub async fn list(ctx: &Context, out: &mut impl Write, shop: Option<&str>) -> Result<(), CliError> {
    let Some(shop) = target_shop(ctx, shop).await? else {
        views::shops(out, &[])?;
        return Ok(());
    };
    let products = ctx.products();
    let page = products.list_for_shop(&shop, 1).await?;
    views::products(out, &page.items, |p| products.image_url(p))?;
    Ok(())
}

/// Create a product, then show the shop's refreshed product list.
pub async fn create(ctx: &Context, out: &mut impl Write, input: CreateInput) -> Result<(), CliError> {
    let tiers = tier_editor(&input.tiers, &input.flat)?;
    let base_price: Price = input.price.parse()?;
    let image = match &input.image {
        Some(path) => Some(read_image(path).await?),
        None => None,
    };

    let mut form = ProductForm {
        shop: target_shop(ctx, input.shop.as_deref()).await?,
        name: input.name,
        base_price,
        tiers,
        image,
    };
    let products = ctx.products();
    let product = form.submit(&products).await?;
    views::product_created(out, &product)?;

    let page = products.list_for_shop(&product.shop, 1).await?;
    views::products(out, &page.items, |p| products.image_url(p))?;
    Ok(())
}

pub async fn migrate_tiers(ctx: &Context, out: &mut impl Write, shop: &str) -> Result<(), CliError> {
    let shop = shop.trim();
    if shop.is_empty() {
        return Err(CliError::Input("A shop ID is required.".to_owned()));
    }
    let report = ctx.products().migrate_tiers(&ShopId::new(shop)).await?;
    views::migration(out, &report)?;
    Ok(())
}

async fn read_image(path: &std::path::Path) -> Result<FileUpload, CliError> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| CliError::Input(format!("Invalid image path: {}", path.display())))?
        .to_owned();
    Ok(FileUpload {
        field: "image".to_owned(),
        mime: FileUpload::guess_mime(&file_name).map(str::to_owned),
        file_name,
        bytes,
    })
}

/// Build the tier editor from `--tier` or `--flat` arguments.
fn tier_editor(grouped: &[String], flat: &[String]) -> Result<TierEditor, CliError> {
    match (grouped.is_empty(), flat.is_empty()) {
        (false, false) => Err(CliError::Input(
            "Use either --tier or --flat, not both.".to_owned(),
        )),
        (_, true) => {
            let mut form = TierForm::<GroupPrice>::new();
            for arg in grouped {
                add_grouped(&mut form, arg)?;
            }
            Ok(TierEditor::Grouped(form))
        }
        (true, false) => {
            let mut form = TierForm::<FlatTier>::new();
            for arg in flat {
                add_flat(&mut form, arg)?;
            }
            Ok(TierEditor::Flat(form))
        }
    }
}

/// `NAME:UNITS:UNIT_PRICE:MIN_QTY`; the name may itself contain `:`.
fn add_grouped(form: &mut TierForm<GroupPrice>, arg: &str) -> Result<(), CliError> {
    let mut parts = arg.rsplitn(4, ':');
    let (Some(min_qty), Some(unit_price), Some(units), Some(name)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(CliError::Input(format!(
            "Tier '{arg}' must look like NAME:UNITS:UNIT_PRICE:MIN_QTY"
        )));
    };

    let index = form.add_tier();
    form.update_tier(index, GroupPriceField::Name, name)?;
    form.update_tier(index, GroupPriceField::Units, units)?;
    form.update_tier(index, GroupPriceField::UnitPrice, unit_price)?;
    form.update_tier(index, GroupPriceField::MinQty, min_qty)?;
    Ok(())
}

/// `NAME=PRICE`
fn add_flat(form: &mut TierForm<FlatTier>, arg: &str) -> Result<(), CliError> {
    let Some((name, price)) = arg.rsplit_once('=') else {
        return Err(CliError::Input(format!("Flat tier '{arg}' must look like NAME=PRICE")));
    };
    let index = form.add_tier();
    form.update_tier(index, FlatTierField::Name, name)?;
    form.update_tier(index, FlatTierField::Price, price)?;
    Ok(())
}
