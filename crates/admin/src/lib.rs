//! Mercado PaTi Admin library.
//!
//! Everything the console does against the remote data service lives here,
//! independent of how it is presented:
//!
//! - [`store`] - the [`RecordStore`](store::RecordStore) contract, the
//!   PocketBase HTTP client and an in-memory store for tests
//! - [`session`] - principals, auth sessions and the reactive session handle
//! - [`models`] - typed views of `users`, `shops` and `products` records
//! - [`services`] - shop creation with ownership resolution, product
//!   creation with tiered pricing, listing, deletion and the system check
//! - [`forms`] - form state that is cleared on success and kept on failure
//! - [`config`] - environment configuration
//!
//! # Security
//!
//! Superuser sessions can provision users with a fixed default password.
//! The password is held as a [`secrecy::SecretString`] and never logged.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod forms;
pub mod models;
pub mod services;
pub mod session;
pub mod store;

pub use error::ErrorKind;
