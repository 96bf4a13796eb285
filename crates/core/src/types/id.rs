//! Newtype ids for type-safe entity references.
//!
//! Ids are ULID strings (26 Crockford base-32 characters): unique, sortable
//! by creation time, and safe to expose in URLs and JSON bodies. Use the
//! `define_id!` macro to create wrappers that prevent accidentally mixing
//! ids from different entity types.

use serde::{Deserialize, Serialize};

/// Error parsing an id from its string form.
#[derive(Debug, Clone, thiserror::Error)]
pub enum IdError {
    /// The input is not a valid ULID.
    #[error("id must be a 26-character ULID")]
    Format,
}

/// Macro to define a type-safe ULID-backed id wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `generate()` producing a fresh ULID and `parse()` validating one
/// - `Display`, `FromStr`, and `AsRef<str>` implementations
/// - `sqlx` `Type`, `Encode`, and `Decode` implementations (with `postgres` feature)
///
/// Deserialization is transparent and does not validate the ULID form;
/// untrusted input must go through `parse()`.
///
/// # Example
///
/// ```rust
/// # use pronto_core::define_id;
/// define_id!(MerchantId);
/// define_id!(OrderId);
///
/// let merchant_id = MerchantId::generate();
///
/// // These are different types, so this won't compile:
/// // let _: OrderId = merchant_id;
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
            /// Generate a fresh id.
            #[must_use]
            pub fn generate() -> Self {
                Self(::ulid::Ulid::new().to_string())
            }

            /// Parse an id, validating the ULID form.
            ///
            /// # Errors
            ///
            /// Returns [`IdError::Format`] if the input is not a valid ULID.
            pub fn parse(s: &str) -> Result<Self, $crate::types::id::IdError> {
                ::ulid::Ulid::from_string(s)
                    .map_err(|_| $crate::types::id::IdError::Format)?;
                Ok(Self(s.to_owned()))
            }

            /// Returns the id as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the id and returns its inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::types::id::IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <String as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <String as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let s = <String as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                // Database values are assumed valid
                Ok(Self(s))
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <String as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

// Define standard entity ids
define_id!(MerchantId);
define_id!(ProductId);
define_id!(QuoteId);
define_id!(OrderId);
