//! The remote commerce backend as seen by the cart layer.

use std::future::Future;

use storefront_cart_core::{CartId, LineId};

use crate::shopify::types::{Cart, CartLineInput, CartLineUpdateInput, Product};
use crate::shopify::{ShopifyError, StorefrontClient};

use super::memory::InMemoryCartBackend;

/// Cart operations exposed by the commerce backend.
///
/// `get_cart` reports an unknown cart as `Ok(None)`; mutations against an
/// unknown cart fail with `ShopifyError::NotFound`. Every other error is a
/// transport, validation, or business-rule failure.
pub trait CartBackend: Send + Sync {
    /// Create an empty cart.
    fn create_cart(&self) -> impl Future<Output = Result<Cart, ShopifyError>> + Send;

    /// Fetch a cart by id.
    fn get_cart(
        &self,
        cart_id: &CartId,
    ) -> impl Future<Output = Result<Option<Cart>, ShopifyError>> + Send;

    /// Add lines to a cart.
    fn add_to_cart(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineInput>,
    ) -> impl Future<Output = Result<Cart, ShopifyError>> + Send;

    /// Update existing lines.
    fn update_cart(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineUpdateInput>,
    ) -> impl Future<Output = Result<Cart, ShopifyError>> + Send;

    /// Remove lines.
    fn remove_from_cart(
        &self,
        cart_id: &CartId,
        line_ids: Vec<LineId>,
    ) -> impl Future<Output = Result<Cart, ShopifyError>> + Send;

    /// Replace the buyer note.
    fn update_cart_note(
        &self,
        cart_id: &CartId,
        note: &str,
    ) -> impl Future<Output = Result<Cart, ShopifyError>> + Send;
}

/// The backend selected at startup.
#[derive(Clone)]
pub enum StoreBackend {
    /// Live Shopify Storefront API.
    Shopify(StorefrontClient),
    /// In-process backend for tests and local development.
    Memory(InMemoryCartBackend),
}

impl StoreBackend {
    /// Get a product by its handle.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` if no product has this handle.
    pub async fn get_product_by_handle(&self, handle: &str) -> Result<Product, ShopifyError> {
        match self {
            Self::Shopify(client) => client.get_product_by_handle(handle).await,
            Self::Memory(memory) => memory.get_product_by_handle(handle),
        }
    }

    /// Short backend name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Shopify(_) => "shopify",
            Self::Memory(_) => "memory",
        }
    }
}

impl CartBackend for StoreBackend {
    async fn create_cart(&self) -> Result<Cart, ShopifyError> {
        match self {
            Self::Shopify(client) => client.create_cart().await,
            Self::Memory(memory) => memory.create_cart().await,
        }
    }

    async fn get_cart(&self, cart_id: &CartId) -> Result<Option<Cart>, ShopifyError> {
        match self {
            Self::Shopify(client) => client.get_cart(cart_id).await,
            Self::Memory(memory) => memory.get_cart(cart_id).await,
        }
    }

    async fn add_to_cart(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineInput>,
    ) -> Result<Cart, ShopifyError> {
        match self {
            Self::Shopify(client) => client.add_to_cart(cart_id, lines).await,
            Self::Memory(memory) => memory.add_to_cart(cart_id, lines).await,
        }
    }

    async fn update_cart(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineUpdateInput>,
    ) -> Result<Cart, ShopifyError> {
        match self {
            Self::Shopify(client) => client.update_cart(cart_id, lines).await,
            Self::Memory(memory) => memory.update_cart(cart_id, lines).await,
        }
    }

    async fn remove_from_cart(
        &self,
        cart_id: &CartId,
        line_ids: Vec<LineId>,
    ) -> Result<Cart, ShopifyError> {
        match self {
            Self::Shopify(client) => client.remove_from_cart(cart_id, line_ids).await,
            Self::Memory(memory) => memory.remove_from_cart(cart_id, line_ids).await,
        }
    }

    async fn update_cart_note(&self, cart_id: &CartId, note: &str) -> Result<Cart, ShopifyError> {
        match self {
            Self::Shopify(client) => client.update_cart_note(cart_id, note).await,
            Self::Memory(memory) => memory.update_cart_note(cart_id, note).await,
        }
    }
}
