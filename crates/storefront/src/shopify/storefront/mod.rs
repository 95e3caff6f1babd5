//! Shopify Storefront API client implementation.
//!
//! Uses `graphql_client` operation types with `reqwest` for HTTP.
//! Caches products using `moka` (5-minute TTL).

mod conversions;
pub mod queries;

use std::sync::Arc;
use std::time::Duration;

use graphql_client::{GraphQLQuery, Response};
use moka::future::Cache;
use secrecy::ExposeSecret;
use storefront_cart_core::{CartId, LineId};
use tracing::{debug, instrument};

use crate::cart::CartBackend;
use crate::config::ShopifyStorefrontConfig;
use crate::shopify::types::{Cart, CartLineInput, CartLineUpdateInput, Product};
use crate::shopify::{GraphQLError, GraphQLErrorLocation, ShopifyError};

use conversions::{convert_cart, convert_product, convert_user_errors, user_errors_to_error};
use queries::{
    AddToCart, AddToCartVariables, CreateCart, CreateCartInput, CreateCartVariables, GetCart,
    GetCartVariables, GetProductByHandle, GetProductByHandleVariables, RawCartLineInput,
    RawCartLineUpdateInput, RawCartPayload, RemoveFromCart, RemoveFromCartVariables,
    UpdateCartLines, UpdateCartLinesVariables, UpdateCartNote, UpdateCartNoteVariables,
};

/// Maximum characters of a response body kept in logs.
const LOG_BODY_LIMIT: usize = 500;

const PRODUCT_CACHE_CAPACITY: u64 = 1000;
const PRODUCT_CACHE_TTL: Duration = Duration::from_secs(300);

// =============================================================================
// StorefrontClient
// =============================================================================

/// Client for the Shopify Storefront API.
///
/// Provides type-safe access to products and cart operations.
/// Products are cached for 5 minutes; carts are always fetched live.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
    /// Products by handle.
    products: Cache<String, Product>,
}

impl StorefrontClient {
    /// Create a new Storefront API client.
    #[must_use]
    pub fn new(config: &ShopifyStorefrontConfig) -> Self {
        let products = Cache::builder()
            .max_capacity(PRODUCT_CACHE_CAPACITY)
            .time_to_live(PRODUCT_CACHE_TTL)
            .build();

        let endpoint = format!(
            "https://{}/api/{}/graphql.json",
            config.store, config.api_version
        );

        Self {
            inner: Arc::new(StorefrontClientInner {
                client: reqwest::Client::new(),
                endpoint,
                access_token: config.storefront_private_token.expose_secret().to_string(),
                products,
            }),
        }
    }

    /// Execute a GraphQL operation.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, ShopifyError> {
        let request_body = Q::build_query(variables);

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            // Private access tokens use a different header than public tokens
            .header(
                "Shopify-Storefront-Private-Token",
                &self.inner.access_token,
            )
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        // Body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %truncate(&response_text, LOG_BODY_LIMIT),
                "Shopify API returned non-success status"
            );
            return Err(ShopifyError::GraphQL(vec![GraphQLError::message(format!(
                "HTTP {status}: {}",
                truncate(&response_text, 200)
            ))]));
        }

        let response: Response<Q::ResponseData> = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %truncate(&response_text, LOG_BODY_LIMIT),
                    "Failed to parse Shopify GraphQL response"
                );
                return Err(ShopifyError::Parse(e));
            }
        };

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            debug!(errors = ?errors, "GraphQL errors in response");

            return Err(ShopifyError::GraphQL(
                errors.into_iter().map(GraphQLError::from).collect(),
            ));
        }

        response.data.ok_or_else(|| {
            tracing::error!(
                body = %truncate(&response_text, LOG_BODY_LIMIT),
                "Shopify GraphQL response has no data and no errors"
            );
            ShopifyError::GraphQL(vec![GraphQLError::message("No data in response")])
        })
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get a product by its handle.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` if no product has this handle, or
    /// another error if the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_product_by_handle(&self, handle: &str) -> Result<Product, ShopifyError> {
        if let Some(product) = self.inner.products.get(handle).await {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let data = self
            .execute::<GetProductByHandle>(GetProductByHandleVariables {
                handle: handle.to_string(),
            })
            .await?;

        let product = data
            .product
            .ok_or_else(|| ShopifyError::NotFound(format!("Product not found: {handle}")))
            .and_then(convert_product)?;

        self.inner
            .products
            .insert(handle.to_string(), product.clone())
            .await;

        Ok(product)
    }
}

// =============================================================================
// Cart Methods (not cached here - mutable state)
// =============================================================================

/// Extract the cart from a mutation payload, surfacing user errors.
fn cart_from_payload(
    cart_id: &str,
    payload: Option<RawCartPayload>,
    failure: &str,
) -> Result<Cart, ShopifyError> {
    if let Some(result) = payload {
        if !result.user_errors.is_empty() {
            let errors = convert_user_errors(result.user_errors);
            return Err(user_errors_to_error(cart_id, &errors));
        }

        if let Some(cart) = result.cart {
            return convert_cart(cart);
        }
    }

    Err(ShopifyError::GraphQL(vec![GraphQLError::message(failure)]))
}

impl CartBackend for StorefrontClient {
    #[instrument(skip(self))]
    async fn create_cart(&self) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<CreateCart>(CreateCartVariables {
                input: CreateCartInput::default(),
            })
            .await?;

        cart_from_payload("(new)", data.cart_create, "Failed to create cart")
    }

    #[instrument(skip(self), fields(cart_id = %cart_id))]
    async fn get_cart(&self, cart_id: &CartId) -> Result<Option<Cart>, ShopifyError> {
        let data = self
            .execute::<GetCart>(GetCartVariables {
                cart_id: cart_id.to_string(),
            })
            .await?;

        data.cart.map(convert_cart).transpose()
    }

    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    async fn add_to_cart(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineInput>,
    ) -> Result<Cart, ShopifyError> {
        let variables = AddToCartVariables {
            cart_id: cart_id.to_string(),
            lines: lines
                .into_iter()
                .map(|line| RawCartLineInput {
                    merchandise_id: line.merchandise_id.into_inner(),
                    quantity: i64::from(line.quantity),
                })
                .collect(),
        };

        let data = self.execute::<AddToCart>(variables).await?;
        cart_from_payload(cart_id.as_str(), data.cart_lines_add, "Failed to add to cart")
    }

    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    async fn update_cart(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineUpdateInput>,
    ) -> Result<Cart, ShopifyError> {
        let variables = UpdateCartLinesVariables {
            cart_id: cart_id.to_string(),
            lines: lines
                .into_iter()
                .map(|line| RawCartLineUpdateInput {
                    id: line.id.into_inner(),
                    merchandise_id: line.merchandise_id.map(|m| m.into_inner()),
                    quantity: line.quantity.map(i64::from),
                })
                .collect(),
        };

        let data = self.execute::<UpdateCartLines>(variables).await?;
        cart_from_payload(
            cart_id.as_str(),
            data.cart_lines_update,
            "Failed to update cart",
        )
    }

    #[instrument(skip(self, line_ids), fields(cart_id = %cart_id))]
    async fn remove_from_cart(
        &self,
        cart_id: &CartId,
        line_ids: Vec<LineId>,
    ) -> Result<Cart, ShopifyError> {
        let variables = RemoveFromCartVariables {
            cart_id: cart_id.to_string(),
            line_ids: line_ids.into_iter().map(LineId::into_inner).collect(),
        };

        let data = self.execute::<RemoveFromCart>(variables).await?;
        cart_from_payload(
            cart_id.as_str(),
            data.cart_lines_remove,
            "Failed to remove from cart",
        )
    }

    #[instrument(skip(self, note), fields(cart_id = %cart_id))]
    async fn update_cart_note(&self, cart_id: &CartId, note: &str) -> Result<Cart, ShopifyError> {
        let variables = UpdateCartNoteVariables {
            cart_id: cart_id.to_string(),
            note: note.to_string(),
        };

        let data = self.execute::<UpdateCartNote>(variables).await?;
        cart_from_payload(
            cart_id.as_str(),
            data.cart_note_update,
            "Failed to update cart note",
        )
    }
}

impl From<graphql_client::Error> for GraphQLError {
    fn from(error: graphql_client::Error) -> Self {
        let locations = error
            .locations
            .unwrap_or_default()
            .into_iter()
            .map(|l| GraphQLErrorLocation {
                line: i64::from(l.line),
                column: i64::from(l.column),
            })
            .collect();
        let path = error
            .path
            .unwrap_or_default()
            .into_iter()
            .map(|fragment| match fragment {
                graphql_client::PathFragment::Key(key) => serde_json::Value::String(key),
                graphql_client::PathFragment::Index(i) => serde_json::Value::Number(i.into()),
            })
            .collect();

        Self {
            message: error.message,
            locations,
            path,
        }
    }
}

/// First `limit` characters of a response body.
fn truncate(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn test_config() -> ShopifyStorefrontConfig {
        ShopifyStorefrontConfig {
            store: "test.myshopify.com".to_string(),
            api_version: "2026-01".to_string(),
            storefront_private_token: SecretString::from("shpat_token"),
        }
    }

    #[test]
    fn test_endpoint_from_config() {
        let client = StorefrontClient::new(&test_config());
        assert_eq!(
            client.inner.endpoint,
            "https://test.myshopify.com/api/2026-01/graphql.json"
        );
    }

    #[test]
    fn test_missing_payload_is_graphql_error() {
        let err = cart_from_payload("cart-1", None, "Failed to add to cart").unwrap_err();
        assert_eq!(err.to_string(), "GraphQL errors: Failed to add to cart");
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("héllo", 2), "hé");
    }
}
