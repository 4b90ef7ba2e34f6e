//! Newtype IDs for type-safe record references.
//!
//! The remote data service identifies every record with an opaque string
//! (15 lowercase alphanumerics for PocketBase). Use the `define_id!` macro to
//! create wrappers that prevent accidentally passing a shop ID where a user ID
//! is expected.

/// Macro to define a type-safe record ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Default`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `AsRef<str>` implementations
///
/// # Example
///
/// ```rust
/// # use mercado_core::define_id;
/// define_id!(AffiliateId);
/// define_id!(SaleId);
///
/// let affiliate_id = AffiliateId::new("a1b2c3d4e5f6g7h");
/// let sale_id = SaleId::new("a1b2c3d4e5f6g7h");
///
/// // These are different types, so this won't compile:
/// // let _: AffiliateId = sale_id;
/// assert_eq!(affiliate_id.as_str(), sale_id.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Default,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from a record identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Record IDs for the collections the console manages
define_id!(UserId);
define_id!(ShopId);
define_id!(ProductId);
define_id!(CollectionId);
