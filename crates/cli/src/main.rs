//! Mercado PaTi console - manage shops and products from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Log in as the platform superuser
//! mercado login -e admin@pati.com -p 1234567890 --superuser
//!
//! # Create a shop owned by someone else (provisions the owner if needed)
//! mercado shops create -n "Abarrotes Pati" -c 12.5 -o owner@example.com
//!
//! # Create a product with two packaging tiers
//! mercado products create --shop <SHOP_ID> -n Refresco --price 18 \
//!     --tier Caja:24:15:1 --tier Pallet:1200:13:1
//! ```
//!
//! # Commands
//!
//! - `login` / `logout` / `whoami` - Session management
//! - `dashboard` - Shop count and sales summary
//! - `shops` - List, create and delete shops
//! - `products` - List and create products, migrate legacy tier data
//! - `verify-system` - Check the backend schema and repair it if missing
//!
//! Logs go to stderr (`RUST_LOG`, default `info`); results go to stdout.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::Write;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod confirm;
mod error;
mod views;

use commands::Context;
use error::CliError;

#[derive(Parser)]
#[command(name = "mercado")]
#[command(author, version, about = "Mercado PaTi marketplace console")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with email and password
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,

        /// Log in as a platform superuser instead of a shop owner
        #[arg(long)]
        superuser: bool,
    },
    /// Clear the stored session
    Logout,
    /// Show the logged-in principal
    Whoami,
    /// Show the dashboard summary
    Dashboard,
    /// Manage shops
    Shops {
        #[command(subcommand)]
        action: ShopAction,
    },
    /// Manage products
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Check the backend schema and repair it if missing
    VerifySystem,
}

#[derive(Subcommand)]
enum ShopAction {
    /// List shops, newest first
    List,
    /// List the shops you own
    Mine,
    /// Create a shop
    Create {
        /// Shop name
        #[arg(short, long)]
        name: String,

        /// Platform commission in percent (0-100)
        #[arg(short, long, default_value = "10")]
        commission: String,

        /// Owner email (superusers only)
        #[arg(short, long, default_value = "")]
        owner: String,

        /// Provision an unknown owner without asking
        #[arg(long)]
        yes: bool,
    },
    /// Delete a shop (its products are kept)
    Delete {
        /// Shop ID
        id: String,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// List the products of a shop
    List {
        /// Shop ID (default: the first shop)
        #[arg(long)]
        shop: Option<String>,
    },
    /// Create a product
    Create {
        /// Shop ID (default: the first shop)
        #[arg(long)]
        shop: Option<String>,

        /// Product name
        #[arg(short, long)]
        name: String,

        /// Base price
        #[arg(long, default_value = "0")]
        price: String,

        /// Image file to upload
        #[arg(long)]
        image: Option<std::path::PathBuf>,

        /// Packaging tier as NAME:UNITS:UNIT_PRICE:MIN_QTY (repeatable)
        #[arg(long = "tier")]
        tiers: Vec<String>,

        /// Flat tier as NAME=PRICE (repeatable)
        #[arg(long = "flat")]
        flat: Vec<String>,
    },
    /// Rewrite legacy tier data of a shop's products to the current format
    MigrateTiers {
        /// Shop ID
        #[arg(long)]
        shop: String,
    },
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(kind = %e.kind(), "command failed");
            let mut err = std::io::stderr().lock();
            let _ = views::error(&mut err, &e);
            let _ = err.flush();
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let ctx = Context::load().await?;
    let mut out = std::io::stdout().lock();

    let result = match cli.command {
        Commands::Login {
            email,
            password,
            superuser,
        } => commands::auth::login(&ctx, &mut out, &email, password, superuser).await,
        Commands::Logout => commands::auth::logout(&ctx, &mut out),
        Commands::Whoami => commands::auth::whoami(&ctx, &mut out),
        Commands::Dashboard => commands::system::dashboard(&ctx, &mut out).await,
        Commands::VerifySystem => commands::system::verify(&ctx, &mut out).await,
        Commands::Shops { action } => match action {
            ShopAction::List => commands::shops::list(&ctx, &mut out).await,
            ShopAction::Mine => commands::shops::mine(&ctx, &mut out).await,
            ShopAction::Create {
                name,
                commission,
                owner,
                yes,
            } => commands::shops::create(&ctx, &mut out, name, &commission, owner, yes).await,
            ShopAction::Delete { id, yes } => {
                commands::shops::delete(&ctx, &mut out, &id, yes).await
            }
        },
        Commands::Products { action } => match action {
            ProductAction::List { shop } => {
                commands::products::list(&ctx, &mut out, shop.as_deref()).await
            }
            ProductAction::Create {
                shop,
                name,
                price,
                image,
                tiers,
                flat,
            } => {
                let input = commands::products::CreateInput {
                    shop,
                    name,
                    price,
                    image,
                    tiers,
                    flat,
                };
                commands::products::create(&ctx, &mut out, input).await
            }
            ProductAction::MigrateTiers { shop } => {
                commands::products::migrate_tiers(&ctx, &mut out, &shop).await
            }
        },
    };

    let flushed = out.flush();
    ctx.finish().await;
    flushed?;
    result
}
