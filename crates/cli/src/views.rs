//! Plain-text rendering of command results.
//!
//! Every view writes to any [`Write`] so it can be tested against a buffer.

use std::io::{self, Write};

use mercado_admin::models::{Product, Shop};
use mercado_admin::services::{DashboardSummary, MigrationReport, SystemStatus};
use mercado_admin::session::Principal;
use mercado_core::PricingTiers;

use crate::error::CliError;

pub const NO_SHOPS: &str = "No shops registered.";
pub const NO_PRODUCTS: &str = "No products in this shop yet.";

pub fn error(w: &mut impl Write, e: &CliError) -> io::Result<()> {
    writeln!(w, "Error: {e}")
}

pub fn whoami(w: &mut impl Write, principal: Option<&Principal>) -> io::Result<()> {
    match principal {
        Some(p) => writeln!(w, "{} ({}, id {})", p.email, p.role, p.id),
        None => writeln!(w, "Not logged in."),
    }
}

pub fn logged_in(w: &mut impl Write, principal: &Principal) -> io::Result<()> {
    writeln!(w, "Logged in as {} ({}).", principal.email, principal.role)
}

pub fn logged_out(w: &mut impl Write) -> io::Result<()> {
    writeln!(w, "Logged out.")
}

pub fn shops(w: &mut impl Write, shops: &[Shop]) -> io::Result<()> {
    if shops.is_empty() {
        return writeln!(w, "{NO_SHOPS}");
    }
    for shop in shops {
        writeln!(w, "{}  [{}]", shop.name, shop.id)?;
        writeln!(w, "  Commission: {}%", shop.commission_rate.normalize())?;
        writeln!(w, "  Owner: {}", shop.owner_email().unwrap_or("N/A"))?;
    }
    Ok(())
}

pub fn shop_created(w: &mut impl Write, shop: &Shop) -> io::Result<()> {
    writeln!(w, "Shop created: {} [{}]", shop.name, shop.id)
}

pub fn shop_deleted(w: &mut impl Write, id: &str) -> io::Result<()> {
    writeln!(w, "Shop {id} deleted.")
}

pub fn cancelled(w: &mut impl Write) -> io::Result<()> {
    writeln!(w, "Cancelled.")
}

/// Products with their tiers; `image_url` resolves each product's image.
pub fn products<F>(w: &mut impl Write, products: &[Product], image_url: F) -> io::Result<()>
where
    F: Fn(&Product) -> String,
{
    if products.is_empty() {
        return writeln!(w, "{NO_PRODUCTS}");
    }
    for product in products {
        writeln!(w, "{}  [{}]", product.name, product.id)?;
        writeln!(w, "  Base price: {}", product.price.display())?;
        writeln!(w, "  Image: {}", image_url(product))?;
        match product.pricing() {
            Ok(tiers) => pricing(w, &tiers)?,
            Err(e) => writeln!(w, "  Tiers: unreadable ({e})")?,
        }
    }
    Ok(())
}

fn pricing(w: &mut impl Write, tiers: &PricingTiers) -> io::Result<()> {
    match tiers {
        PricingTiers::Grouped { tiers } => {
            for tier in tiers {
                writeln!(
                    w,
                    "  - {}: {} x {} x {} = ${}",
                    tier.name,
                    tier.units.normalize(),
                    tier.unit_price.display(),
                    tier.min_qty.normalize(),
                    tier.formatted_total()
                )?;
            }
        }
        PricingTiers::Flat { prices } => {
            for (name, price) in prices {
                writeln!(w, "  - {name}: {}", price.display())?;
            }
        }
    }
    Ok(())
}

pub fn product_created(w: &mut impl Write, product: &Product) -> io::Result<()> {
    writeln!(w, "Product created: {} [{}]", product.name, product.id)
}

pub fn dashboard(w: &mut impl Write, summary: &DashboardSummary) -> io::Result<()> {
    writeln!(w, "Welcome, {}.", summary.principal.email)?;
    writeln!(w, "Active shops: {}", summary.active_shops)?;
    writeln!(w, "Sales this month: {}", summary.monthly_sales.display())?;
    if !summary.principal.is_superuser() {
        writeln!(w)?;
        writeln!(w, "My shops:")?;
        if summary.my_shops.is_empty() {
            writeln!(w, "  {NO_SHOPS}")?;
        }
        for shop in &summary.my_shops {
            writeln!(
                w,
                "  {} - platform commission {}%",
                shop.name,
                shop.commission_rate.normalize()
            )?;
        }
    }
    Ok(())
}

pub fn system_status(w: &mut impl Write, status: &SystemStatus) -> io::Result<()> {
    match status {
        SystemStatus::Healthy { shops } => {
            writeln!(w, "System OK: shops collection reachable ({shops} shops).")
        }
        SystemStatus::Repaired { message } => {
            writeln!(w, "Shops collection was missing; repair succeeded: {message}")
        }
        SystemStatus::RepairFailed { error } => {
            writeln!(w, "Shops collection is missing and the repair failed: {error}")
        }
    }
}

pub fn migration(w: &mut impl Write, report: &MigrationReport) -> io::Result<()> {
    writeln!(
        w,
        "Scanned {} products, migrated {}.",
        report.scanned,
        report.migrated.len()
    )?;
    for id in &report.unreadable {
        writeln!(w, "  Skipped {id}: tier data could not be read.")?;
    }
    Ok(())
}
