//! Newtype ids for type-safe references to backend records.
//!
//! The commerce backend identifies everything with opaque global id strings
//! (`gid://shopify/Cart/...`). Use the `define_gid!` macro to create wrappers
//! that prevent accidentally passing a line id where a cart id is expected.

use thiserror::Error;

/// Error parsing an id from caller input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// The id was empty or whitespace only.
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// Macro to define a type-safe global id wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - `parse()` rejecting empty input, `as_str()`, `into_inner()`
/// - `Display` and `AsRef<str>`
///
/// # Example
///
/// ```rust
/// # use storefront_cart_core::define_gid;
/// define_gid!(CartId, "cart id");
/// define_gid!(LineId, "line id");
///
/// let cart_id = CartId::parse("gid://shopify/Cart/1").unwrap();
/// assert!(LineId::parse("  ").is_err());
///
/// // These are different types, so this won't compile:
/// // let _: LineId = cart_id;
/// ```
#[macro_export]
macro_rules! define_gid {
    ($name:ident, $label:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Parse an id from caller input, rejecting empty values.
            ///
            /// # Errors
            ///
            /// Returns `IdError::Empty` if the input is empty or whitespace.
            pub fn parse(value: impl Into<String>) -> ::core::result::Result<Self, $crate::IdError> {
                let value = value.into();
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err($crate::IdError::Empty($label));
                }
                if trimmed.len() == value.len() {
                    Ok(Self(value))
                } else {
                    Ok(Self(trimmed.to_string()))
                }
            }

            /// Get the id as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the raw id.
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

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Backend record ids
define_gid!(CartId, "cart id");
define_gid!(LineId, "line id");
define_gid!(MerchandiseId, "merchandise id");
define_gid!(ProductId, "product id");

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!(CartId::parse(""), Err(IdError::Empty("cart id")));
        assert_eq!(LineId::parse("   "), Err(IdError::Empty("line id")));
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let id = MerchandiseId::parse(" gid://shopify/ProductVariant/1 ").unwrap();
        assert_eq!(id.as_str(), "gid://shopify/ProductVariant/1");
    }

    #[test]
    fn test_error_display_names_the_field() {
        let err = LineId::parse("").unwrap_err();
        assert_eq!(err.to_string(), "line id must not be empty");
    }

    #[test]
    fn test_serde_transparent() {
        let id = CartId::parse("cart-abc").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"cart-abc\"");
        let back: CartId = serde_json::from_str("\"cart-abc\"").unwrap();
        assert_eq!(back, id);
    }
}
