//! Integration tests for the storefront cart.
//!
//! Requests run against the full axum router in-process, over the
//! in-memory backend, so no network or Shopify credentials are needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p storefront-cart-integration-tests
//! ```
//!
//! [`TestContext`] keeps a one-cookie jar, so a sequence of requests
//! behaves like a single browser session.

#![cfg_attr(not(test), forbid(unsafe_code))]

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use serde_json::Value;
use storefront_cart::{
    cart::{CART_ID_COOKIE, InMemoryCartBackend, StoreBackend},
    config::StorefrontConfig,
    shopify::types::{Product, ProductOption, ProductVariant, SelectedOption},
    state::AppState,
};
use storefront_cart_core::{MerchandiseId, Price, ProductId};
use tower::ServiceExt;

/// Boxed error for helper failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A response with its body collected.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// Header value as a string, if present.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Parse the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid JSON.
    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// An app over an in-memory backend plus the shopper's cookie.
pub struct TestContext {
    pub backend: InMemoryCartBackend,
    app: Router,
    cart_cookie: Option<String>,
}

impl TestContext {
    /// App over an in-memory backend stocked with [`sample_product`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_backend(InMemoryCartBackend::new().with_product(sample_product()))
    }

    /// App over the given backend.
    #[must_use]
    pub fn with_backend(backend: InMemoryCartBackend) -> Self {
        let state = AppState::with_backend(
            StorefrontConfig::default(),
            StoreBackend::Memory(backend.clone()),
        );

        Self {
            backend,
            app: storefront_cart::app(state),
            cart_cookie: None,
        }
    }

    /// The `cartId` cookie value currently held by the jar.
    #[must_use]
    pub fn cart_cookie(&self) -> Option<&str> {
        self.cart_cookie.as_deref()
    }

    /// Put a cookie value in the jar, as a returning browser would.
    pub fn set_cart_cookie(&mut self, value: impl Into<String>) {
        self.cart_cookie = Some(value.into());
    }

    /// `GET` a path.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be built or the body read.
    pub async fn get(&mut self, path: &str) -> Result<TestResponse, BoxError> {
        self.send(Method::GET, path, None).await
    }

    /// `POST` a url-encoded form.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be built or the body read.
    pub async fn post_form(&mut self, path: &str, form: &str) -> Result<TestResponse, BoxError> {
        self.send(Method::POST, path, Some(form)).await
    }

    /// `GET /api/cart/summary` as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not JSON.
    pub async fn summary(&mut self) -> Result<Value, BoxError> {
        Ok(self.get("/api/cart/summary").await?.json()?)
    }

    async fn send(
        &mut self,
        method: Method,
        path: &str,
        form: Option<&str>,
    ) -> Result<TestResponse, BoxError> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(value) = &self.cart_cookie {
            builder = builder.header(header::COOKIE, format!("{CART_ID_COOKIE}={value}"));
        }
        let request = match form {
            Some(form) => builder
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form.to_string()))?,
            None => builder.body(Body::empty())?,
        };

        let Ok(response) = self.app.clone().oneshot(request).await;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;

        self.apply_set_cookie(&headers);

        Ok(TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }

    /// Store or clear the cart cookie from `Set-Cookie` headers.
    fn apply_set_cookie(&mut self, headers: &HeaderMap) {
        for value in headers.get_all(header::SET_COOKIE) {
            let Ok(value) = value.to_str() else {
                continue;
            };
            let Some((name, rest)) = value.split_once('=') else {
                continue;
            };
            if name.trim() != CART_ID_COOKIE {
                continue;
            }

            let cookie_value = rest.split(';').next().unwrap_or_default().trim();
            let removed = cookie_value.is_empty() || value.contains("Max-Age=0");
            self.cart_cookie = (!removed).then(|| cookie_value.to_string());
        }
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

fn option(name: &str, value: &str) -> SelectedOption {
    SelectedOption {
        name: name.to_string(),
        value: value.to_string(),
    }
}

fn variant(id: &str, size: &str, color: &str, available: bool) -> ProductVariant {
    ProductVariant {
        id: MerchandiseId::parse(id).unwrap_or_else(|_| unreachable!()),
        title: format!("{size} / {color}"),
        available_for_sale: available,
        price: Price::parse("25.00", "USD").unwrap_or_else(|_| unreachable!()),
        compare_at_price: None,
        selected_options: vec![option("Size", size), option("Color", color)],
    }
}

/// A two-option tee: `Size` S/M by `Color` Red/Blue, handle `tee`.
///
/// `variant-s-red` is sold out, so the default variant is `variant-s-blue`.
#[must_use]
pub fn sample_product() -> Product {
    Product {
        id: ProductId::parse("product-tee").unwrap_or_else(|_| unreachable!()),
        handle: "tee".to_string(),
        title: "Tee".to_string(),
        options: vec![
            ProductOption {
                name: "Size".to_string(),
                values: vec!["S".to_string(), "M".to_string()],
            },
            ProductOption {
                name: "Color".to_string(),
                values: vec!["Red".to_string(), "Blue".to_string()],
            },
        ],
        variants: vec![
            variant("variant-s-red", "S", "Red", false),
            variant("variant-s-blue", "S", "Blue", true),
            variant("variant-m-red", "M", "Red", true),
            variant("variant-m-blue", "M", "Blue", true),
        ],
    }
}
