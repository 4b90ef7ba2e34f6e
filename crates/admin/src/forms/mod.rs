//! Form state behind the create actions.
//!
//! A form is submitted with a single remote create. On success the fields a
//! user would retype are cleared; on failure nothing changes so the input can
//! be corrected and resubmitted.

mod product;
mod shop;

pub use product::{ProductForm, TierEditor};
pub use shop::ShopForm;
