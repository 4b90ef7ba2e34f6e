//! Session commands.

use std::io::Write;

use mercado_core::PrincipalRole;
use secrecy::SecretString;

use super::Context;
use crate::error::CliError;
use crate::views;

/// Log in against the user or superuser collection.
pub async fn login(
    ctx: &Context,
    out: &mut impl Write,
    email: &str,
    password: String,
    superuser: bool,
) -> Result<(), CliError> {
    let role = if superuser {
        PrincipalRole::Superuser
    } else {
        PrincipalRole::User
    };
    let password = SecretString::from(password);
    let session = ctx
        .client
        .authenticate(role, email.trim(), &password)
        .await?;
    views::logged_in(out, session.principal())?;
    Ok(())
}

pub fn logout(ctx: &Context, out: &mut impl Write) -> Result<(), CliError> {
    ctx.session.logout();
    views::logged_out(out)?;
    Ok(())
}

pub fn whoami(ctx: &Context, out: &mut impl Write) -> Result<(), CliError> {
    views::whoami(out, ctx.session.principal().as_ref())?;
    Ok(())
}
