//! Dashboard and backend check.

use std::io::Write;

use mercado_admin::services::{Dashboard, SystemCheck};

use super::Context;
use crate::error::CliError;
use crate::views;

pub async fn dashboard(ctx: &Context, out: &mut impl Write) -> Result<(), CliError> {
    // Fail with the login hint before any request.
    ctx.principal()?;
    let shops = ctx.shops();
    let summary = Dashboard::new(&shops).summary().await?;
    views::dashboard(out, &summary)?;
    Ok(())
}

/// Check that `shops` is reachable and repair the schema if it is missing.
pub async fn verify(ctx: &Context, out: &mut impl Write) -> Result<(), CliError> {
    let status = SystemCheck::new(ctx.client.clone()).run().await?;
    views::system_status(out, &status)?;
    Ok(())
}
