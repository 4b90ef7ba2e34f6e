//! CLI error type.

use mercado_admin::ErrorKind;
use mercado_admin::config::ConfigError;
use mercado_admin::services::{ProductError, ShopError};
use mercado_admin::store::StoreError;
use mercado_core::{CommissionRateError, PriceError, TierError};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Shop(#[from] ShopError),

    #[error(transparent)]
    Product(#[from] ProductError),

    #[error("Invalid tier: {0}")]
    Tier(#[from] TierError),

    #[error("Invalid commission: {0}")]
    Commission(#[from] CommissionRateError),

    #[error("Invalid price: {0}")]
    Price(#[from] PriceError),

    /// Malformed command-line input.
    #[error("{0}")]
    Input(String),

    #[error("You are not logged in. Run `mercado login` first.")]
    NotLoggedIn,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Classify the failure.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Store(e) => e.kind(),
            Self::Shop(e) => e.kind(),
            Self::Product(e) => e.kind(),
            Self::Config(_)
            | Self::Tier(_)
            | Self::Commission(_)
            | Self::Price(_)
            | Self::Input(_)
            | Self::NotLoggedIn => ErrorKind::Validation,
            Self::Io(_) => ErrorKind::Network,
        }
    }
}
