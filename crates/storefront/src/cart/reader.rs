//! Null-safe cart reads.
//!
//! Every read returns a value. No identity, an unknown cart, and a backend
//! failure all collapse to the empty shape, since a cart badge must never
//! block or visibly fail.

use serde::Serialize;
use storefront_cart_core::{CartId, LineId, MerchandiseId, Price};
use tracing::{debug, instrument, warn};

use crate::shopify::types::{Cart, CartLine};

use super::backend::CartBackend;
use super::cache::CartCache;

/// Cart totals for badges and indicators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub total_quantity: u32,
    pub line_count: usize,
}

impl CartSummary {
    #[must_use]
    pub const fn has_items(&self) -> bool {
        self.total_quantity > 0
    }
}

impl From<&Cart> for CartSummary {
    fn from(cart: &Cart) -> Self {
        Self {
            total_quantity: cart.total_quantity,
            line_count: cart.lines.len(),
        }
    }
}

/// Cart contents for the cart page.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartDetail {
    pub lines: Vec<CartLine>,
    pub total_quantity: u32,
    pub note: Option<String>,
    pub subtotal: Option<Price>,
    pub checkout_url: Option<String>,
}

impl From<Cart> for CartDetail {
    fn from(cart: Cart) -> Self {
        Self {
            total_quantity: cart.total_quantity,
            note: cart.note,
            subtotal: Some(cart.cost.subtotal),
            checkout_url: Some(cart.checkout_url),
            lines: cart.lines,
        }
    }
}

/// Whether one variant is in the cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantCartState {
    pub is_in_cart: bool,
    pub quantity: u32,
    pub line_id: Option<LineId>,
}

impl VariantCartState {
    fn from_cart(cart: &Cart, merchandise_id: &MerchandiseId) -> Self {
        cart.line_for(merchandise_id)
            .map_or_else(Self::default, |line| Self {
                is_in_cart: true,
                quantity: line.quantity,
                line_id: Some(line.id.clone()),
            })
    }
}

/// Read facade over the backend and the tagged cart cache.
#[derive(Clone)]
pub struct CartReader<B> {
    backend: B,
    cache: CartCache,
}

impl<B: CartBackend> CartReader<B> {
    #[must_use]
    pub const fn new(backend: B, cache: CartCache) -> Self {
        Self { backend, cache }
    }

    /// Current cart for an identity, or `None` for every flavor of "no cart".
    #[instrument(skip(self))]
    pub async fn fetch(&self, identity: Option<&CartId>) -> Option<Cart> {
        let cart_id = identity?;

        if let Some(cached) = self.cache.get_cart(cart_id).await {
            debug!("Cache hit for cart");
            return cached;
        }

        match self.backend.get_cart(cart_id).await {
            Ok(cart) => {
                if cart.is_none() {
                    debug!(cart_id = %cart_id, "Backend has no cart for identity");
                }
                self.cache.insert_cart(cart_id, cart.clone()).await;
                cart
            }
            Err(e) => {
                warn!(cart_id = %cart_id, error = %e, "Cart read failed; treating as empty");
                None
            }
        }
    }

    /// Totals for the cart, zero when there is none.
    pub async fn read_summary(&self, identity: Option<&CartId>) -> CartSummary {
        self.fetch(identity)
            .await
            .map_or_else(CartSummary::default, |cart| CartSummary::from(&cart))
    }

    /// Lines of the cart, empty when there is none.
    pub async fn read_detail(&self, identity: Option<&CartId>) -> CartDetail {
        self.fetch(identity)
            .await
            .map_or_else(CartDetail::default, CartDetail::from)
    }

    /// In-cart state of one variant.
    pub async fn read_variant(
        &self,
        identity: Option<&CartId>,
        merchandise_id: &MerchandiseId,
    ) -> VariantCartState {
        self.fetch(identity)
            .await
            .map_or_else(VariantCartState::default, |cart| {
                VariantCartState::from_cart(&cart, merchandise_id)
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::cart::gateway::CartGateway;
    use crate::cart::identity::{IdentityStore, SharedIdentityStore};
    use crate::cart::memory::InMemoryCartBackend;

    fn setup() -> (
        CartGateway<InMemoryCartBackend>,
        CartReader<InMemoryCartBackend>,
        InMemoryCartBackend,
    ) {
        let backend = InMemoryCartBackend::new();
        let cache = CartCache::new(Duration::from_secs(30));
        (
            CartGateway::new(backend.clone(), cache.clone()),
            CartReader::new(backend.clone(), cache),
            backend,
        )
    }

    #[tokio::test]
    async fn test_absent_identity_is_empty() {
        let (_, reader, backend) = setup();

        assert_eq!(reader.read_summary(None).await, CartSummary::default());
        assert!(reader.read_detail(None).await.lines.is_empty());
        assert_eq!(backend.call_counts().get, 0);
    }

    #[tokio::test]
    async fn test_unknown_cart_is_empty() {
        let (_, reader, _) = setup();
        let cart_id = CartId::parse("cart-abc").unwrap();

        let summary = reader.read_summary(Some(&cart_id)).await;

        assert_eq!(summary.total_quantity, 0);
        assert!(!summary.has_items());
    }

    #[tokio::test]
    async fn test_backend_failure_is_empty() {
        let (gateway, reader, backend) = setup();
        let mut store = SharedIdentityStore::new();
        gateway.add_line(&mut store, "v-1", 1).await.unwrap();
        gateway.cache().invalidate_tag(crate::cart::cache::CacheTag::Cart);
        backend.set_unavailable(true);

        let detail = reader.read_detail(store.get().as_ref()).await;

        assert!(detail.lines.is_empty());
        assert!(detail.checkout_url.is_none());
    }

    #[tokio::test]
    async fn test_summary_reflects_successful_mutation() {
        let (gateway, reader, _) = setup();
        let mut store = SharedIdentityStore::new();
        gateway.add_line(&mut store, "v-1", 1).await.unwrap();
        let identity = store.get();

        assert_eq!(reader.read_summary(identity.as_ref()).await.total_quantity, 1);

        gateway.add_line(&mut store, "v-2", 2).await.unwrap();
        let summary = reader.read_summary(identity.as_ref()).await;
        assert_eq!(summary.total_quantity, 3);
        assert_eq!(summary.line_count, 2);
    }

    #[tokio::test]
    async fn test_summary_unchanged_after_failed_mutation() {
        let (gateway, reader, backend) = setup();
        let mut store = SharedIdentityStore::new();
        gateway.add_line(&mut store, "v-1", 1).await.unwrap();
        let identity = store.get();
        let before = reader.read_summary(identity.as_ref()).await;

        backend.reject_next_mutation("Sold out");
        gateway.add_line(&mut store, "v-2", 1).await.unwrap_err();

        assert_eq!(reader.read_summary(identity.as_ref()).await, before);
    }

    #[tokio::test]
    async fn test_reads_are_cached_until_invalidated() {
        let (gateway, reader, backend) = setup();
        let mut store = SharedIdentityStore::new();
        gateway.add_line(&mut store, "v-1", 1).await.unwrap();
        let identity = store.get();

        reader.read_summary(identity.as_ref()).await;
        reader.read_summary(identity.as_ref()).await;
        assert_eq!(backend.call_counts().get, 1);

        gateway.update_note(&mut store, "hi").await.unwrap();
        reader.read_summary(identity.as_ref()).await;
        assert_eq!(backend.call_counts().get, 2);
    }

    #[tokio::test]
    async fn test_read_variant() {
        let (gateway, reader, _) = setup();
        let mut store = SharedIdentityStore::new();
        gateway.add_line(&mut store, "v-1", 2).await.unwrap();
        let identity = store.get();

        let state = reader
            .read_variant(identity.as_ref(), &MerchandiseId::parse("v-1").unwrap())
            .await;
        assert!(state.is_in_cart);
        assert_eq!(state.quantity, 2);
        assert_eq!(state.line_id.unwrap().as_str(), "line-1");

        let state = reader
            .read_variant(identity.as_ref(), &MerchandiseId::parse("v-9").unwrap())
            .await;
        assert_eq!(state, VariantCartState::default());
    }
}
