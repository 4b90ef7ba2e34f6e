//! Mercado PaTi Core - Shared types library.
//!
//! This crate provides common types used across all Mercado PaTi components:
//! - `admin` - Remote data service client, identity resolution and services
//! - `cli` - The `mercado` command-line console
//!
//! # Architecture
//!
//! The core crate contains only types and pure computations - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for record IDs, prices, emails, commission rates and roles
//! - [`pricing`] - Tiered (volume) pricing model and the in-progress tier form

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod pricing;
pub mod types;

pub use pricing::{
    FlatTier, FlatTierField, GroupPrice, GroupPriceField, PricingTiers, StoredShape, TierError,
    TierForm, TierRow,
};
pub use types::*;
