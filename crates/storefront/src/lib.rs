//! Storefront cart library.
//!
//! Cart session synchronization for a headless Shopify storefront, exposed
//! as a library so the HTTP surface can be tested end to end.
//!
//! # Modules
//!
//! - [`cart`] - Identity, variant resolution, mutations, reads, observers, bus
//! - [`shopify`] - Storefront API client and domain types
//! - [`routes`] - Axum handlers
//! - [`config`] / [`state`] / [`error`] - Ambient application plumbing

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod config;
pub mod error;
pub mod routes;
pub mod shopify;
pub mod state;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the application router with request tracing.
pub fn app(state: AppState) -> Router {
    routes::routes()
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}
