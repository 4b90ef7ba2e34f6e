//! Business logic services for the console.
//!
//! # Services
//!
//! - `ownership` - Owner policy and owner resolution for new shops
//! - `shops` - Shop creation, listing and deletion
//! - `products` - Product creation with tiered pricing, listing and tier migration
//! - `system` - Backend schema check with automatic repair
//! - `dashboard` - Landing summary for the logged-in principal

pub mod dashboard;
pub mod ownership;
pub mod products;
pub mod shops;
pub mod system;

pub use dashboard::{Dashboard, DashboardSummary};
pub use ownership::{AlwaysConfirm, Confirm, NeverConfirm, OwnerPolicy, OwnerResolution, resolve_owner};
pub use products::{MigrationReport, NewProduct, PLACEHOLDER_IMAGE_URL, ProductError, ProductService};
pub use shops::{NewShop, ShopError, ShopService};
pub use system::{SystemCheck, SystemStatus};
