//! Storefront routes.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                  - Liveness check
//!
//! # Products
//! GET  /products/{handle}       - Product with the variant selected by
//!                                 query parameters (?size=M&color=Blue)
//!
//! # Cart (HTMX fragments)
//! GET  /cart                    - Cart contents (JSON)
//! POST /cart/add                - Add to cart (count fragment, triggers cart-updated)
//! POST /cart/update             - Update quantity; 0 removes (count fragment)
//! POST /cart/remove             - Remove line (count fragment)
//! POST /cart/note               - Update buyer note (count fragment)
//! GET  /cart/count              - Cart count badge (fragment)
//!
//! # Cart API (observers)
//! GET  /api/cart/summary        - { totalQuantity, hasItems, itemCount }
//! GET  /api/cart/variants/{id}  - { isInCart, quantity, lineId }
//!
//! # Checkout
//! GET  /checkout                - Redirect to Shopify checkout
//! ```

pub mod api;
pub mod cart;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new().route("/{handle}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/note", post(cart::note))
        .route("/count", get(cart::count))
}

/// Create the cart API routes router.
pub fn cart_api_routes() -> Router<AppState> {
    Router::new()
        .route("/summary", get(api::cart::summary))
        .route("/variants/{id}", get(api::cart::variant))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        // Product routes
        .nest("/products", product_routes())
        // Cart routes
        .nest("/cart", cart_routes())
        // Checkout redirect
        .route("/checkout", get(cart::checkout))
        // Observer API
        .nest("/api/cart", cart_api_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the backend.
async fn health() -> &'static str {
    "ok"
}
