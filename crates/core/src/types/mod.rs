//! Core types for Mercado PaTi.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod commission;
pub mod email;
pub mod id;
pub mod price;
pub mod role;

pub use commission::{CommissionRate, CommissionRateError};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError};
pub use role::{PrincipalRole, SUPERUSER_COLLECTION, USER_COLLECTION};
