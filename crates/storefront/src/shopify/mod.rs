//! Shopify Storefront API client.
//!
//! # Architecture
//!
//! - Hand-declared operations implementing `graphql_client::GraphQLQuery`
//! - Shopify is source of truth - NO local cart copy, direct API calls
//! - Product reads cached via `moka` (5 minute TTL); carts are never cached
//!   here (the cart layer owns a tag-invalidated read cache)
//!
//! # Example
//!
//! ```rust,ignore
//! use storefront_cart::cart::CartBackend;
//! use storefront_cart::shopify::StorefrontClient;
//!
//! let client = StorefrontClient::new(&shopify_config);
//!
//! let cart = client.create_cart().await?;
//! let cart = client.add_to_cart(&cart.id, vec![CartLineInput {
//!     merchandise_id: variant.id.clone(),
//!     quantity: 1,
//! }]).await?;
//! ```

mod storefront;
pub mod types;

pub use storefront::StorefrontClient;
pub use types::*;

use std::fmt;

use thiserror::Error;

/// Errors that can occur when interacting with Shopify APIs.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// User error from mutation (e.g., out of stock, invalid quantity).
    #[error("User error: {0}")]
    UserError(String),
}

impl ShopifyError {
    /// Whether the backend has no record of the requested resource.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// A GraphQL error returned by the Shopify API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

impl GraphQLError {
    /// An error with only a message.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: vec![],
            path: vec![],
        }
    }
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

impl fmt::Display for GraphQLError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::with_capacity(3);
        if !self.message.is_empty() {
            parts.push(self.message.clone());
        }
        if !self.path.is_empty() {
            let segments: Vec<String> = self
                .path
                .iter()
                .map(|segment| match segment {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect();
            parts.push(format!("path: {}", segments.join(".")));
        }
        if let Some(loc) = self.locations.first() {
            parts.push(format!("at line {}:{}", loc.line, loc.column));
        }

        if parts.is_empty() {
            f.write_str("(no details)")
        } else {
            f.write_str(&parts.join(" "))
        }
    }
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
