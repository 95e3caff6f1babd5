//! Cart mutations against the remote backend.
//!
//! Each operation resolves the identity from an [`IdentityStore`], calls the
//! backend once, and translates the outcome into [`CartError`]. Success drops
//! the [`CacheTag::Cart`] cache tag; failure leaves the cache untouched so the
//! caller's view stays stale rather than assumed-successful.

use storefront_cart_core::{CartId, LineId, MerchandiseId};
use tracing::{info, instrument, warn};

use crate::error::add_breadcrumb;
use crate::shopify::ShopifyError;
use crate::shopify::types::{Cart, CartLineInput, CartLineUpdateInput};

use super::backend::CartBackend;
use super::cache::{CacheTag, CartCache};
use super::error::CartError;
use super::identity::{IdentityStore, ensure_identity};

/// Largest quantity a single mutation may carry (the backend's `Int`).
pub const MAX_LINE_QUANTITY: u32 = i32::MAX.unsigned_abs();

fn check_quantity_limit(quantity: u32) -> Result<(), CartError> {
    if quantity > MAX_LINE_QUANTITY {
        return Err(CartError::Validation(format!(
            "Quantity must be at most {MAX_LINE_QUANTITY}"
        )));
    }
    Ok(())
}

/// Server-side cart mutation operations.
#[derive(Clone)]
pub struct CartGateway<B> {
    backend: B,
    cache: CartCache,
}

impl<B: CartBackend> CartGateway<B> {
    #[must_use]
    pub const fn new(backend: B, cache: CartCache) -> Self {
        Self { backend, cache }
    }

    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    #[must_use]
    pub const fn cache(&self) -> &CartCache {
        &self.cache
    }

    /// Add `quantity` of a variant, creating the cart if the session has none.
    ///
    /// A stale identity (backend no longer knows the cart) is abandoned and a
    /// fresh cart is created for the same add.
    ///
    /// # Errors
    ///
    /// `Validation` for an empty merchandise id, a zero quantity or one above
    /// [`MAX_LINE_QUANTITY`],
    /// `BackendUnavailable`/`Rejected` for backend failures.
    #[instrument(skip(self, store))]
    pub async fn add_line<S>(
        &self,
        store: &mut S,
        merchandise_id: &str,
        quantity: u32,
    ) -> Result<Cart, CartError>
    where
        S: IdentityStore + ?Sized,
    {
        let merchandise_id = MerchandiseId::parse(merchandise_id)?;
        if quantity == 0 {
            return Err(CartError::Validation(
                "Quantity must be at least 1".to_string(),
            ));
        }
        check_quantity_limit(quantity)?;
        let lines = vec![CartLineInput {
            merchandise_id,
            quantity,
        }];

        let cart_id = ensure_identity(store, &self.backend).await?;
        match self.backend.add_to_cart(&cart_id, lines.clone()).await {
            Err(e) if e.is_not_found() => {
                warn!(cart_id = %cart_id, "Cart expired; starting a new cart");
                store.forget();
                let cart_id = ensure_identity(store, &self.backend).await?;
                let result = self.backend.add_to_cart(&cart_id, lines).await;
                self.finish(store, &cart_id, result, "add")
            }
            result => self.finish(store, &cart_id, result, "add"),
        }
    }

    /// Set a line's quantity. Zero removes the line.
    ///
    /// # Errors
    ///
    /// `Validation` for empty ids or a quantity above [`MAX_LINE_QUANTITY`],
    /// `MissingCart` without an identity,
    /// `NotFound` if the backend lost the cart, `BackendUnavailable`/`Rejected`
    /// otherwise.
    #[instrument(skip(self, store))]
    pub async fn update_line<S>(
        &self,
        store: &mut S,
        line_id: &str,
        merchandise_id: &str,
        quantity: u32,
    ) -> Result<Cart, CartError>
    where
        S: IdentityStore + ?Sized,
    {
        let line_id = LineId::parse(line_id)?;
        let merchandise_id = MerchandiseId::parse(merchandise_id)?;
        check_quantity_limit(quantity)?;
        let cart_id = store.get().ok_or(CartError::MissingCart)?;

        if quantity == 0 {
            info!(path = "update_to_zero", "Routing zero-quantity update to removal");
            add_breadcrumb("cart", "update_to_zero", Some(&[("line_id", line_id.as_str())]));
            let result = self
                .backend
                .remove_from_cart(&cart_id, vec![line_id])
                .await;
            return self.finish(store, &cart_id, result, "remove");
        }

        let lines = vec![CartLineUpdateInput {
            id: line_id,
            merchandise_id: Some(merchandise_id),
            quantity: Some(quantity),
        }];
        let result = self.backend.update_cart(&cart_id, lines).await;
        self.finish(store, &cart_id, result, "update")
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// `Validation` for an empty line id, `MissingCart` without an identity,
    /// `NotFound` if the backend lost the cart, `BackendUnavailable`/`Rejected`
    /// otherwise.
    #[instrument(skip(self, store))]
    pub async fn remove_line<S>(&self, store: &mut S, line_id: &str) -> Result<Cart, CartError>
    where
        S: IdentityStore + ?Sized,
    {
        let line_id = LineId::parse(line_id)?;
        let cart_id = store.get().ok_or(CartError::MissingCart)?;

        let result = self
            .backend
            .remove_from_cart(&cart_id, vec![line_id])
            .await;
        self.finish(store, &cart_id, result, "remove")
    }

    /// Replace the buyer note. Length limits are the backend's.
    ///
    /// # Errors
    ///
    /// `MissingCart` without an identity, `NotFound` if the backend lost the
    /// cart, `BackendUnavailable`/`Rejected` otherwise.
    #[instrument(skip(self, store, note))]
    pub async fn update_note<S>(&self, store: &mut S, note: &str) -> Result<Cart, CartError>
    where
        S: IdentityStore + ?Sized,
    {
        let cart_id = store.get().ok_or(CartError::MissingCart)?;

        let result = self.backend.update_cart_note(&cart_id, note).await;
        self.finish(store, &cart_id, result, "note")
    }

    /// Translate a backend result, invalidating the cart tag on success.
    fn finish<S>(
        &self,
        store: &mut S,
        cart_id: &CartId,
        result: Result<Cart, ShopifyError>,
        operation: &'static str,
    ) -> Result<Cart, CartError>
    where
        S: IdentityStore + ?Sized,
    {
        match result {
            Ok(cart) => {
                self.cache.invalidate_tag(CacheTag::Cart);
                info!(
                    cart_id = %cart.id,
                    operation,
                    total_quantity = cart.total_quantity,
                    "Cart updated"
                );
                Ok(cart)
            }
            Err(e) => {
                let err = CartError::from_backend(cart_id, e);
                if matches!(err, CartError::NotFound(_)) {
                    store.forget();
                }
                warn!(cart_id = %cart_id, operation, error = %err, "Cart mutation failed");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::cart::identity::SharedIdentityStore;
    use crate::cart::memory::InMemoryCartBackend;

    fn gateway() -> (CartGateway<InMemoryCartBackend>, InMemoryCartBackend) {
        let backend = InMemoryCartBackend::new();
        let gateway = CartGateway::new(backend.clone(), CartCache::new(Duration::from_secs(30)));
        (gateway, backend)
    }

    #[tokio::test]
    async fn test_add_creates_cart_and_binds_identity() {
        let (gateway, backend) = gateway();
        let mut store = SharedIdentityStore::new();

        let cart = gateway.add_line(&mut store, "variant-123", 1).await.unwrap();

        assert_eq!(store.get().unwrap(), cart.id);
        assert_eq!(cart.total_quantity, 1);
        assert_eq!(backend.call_counts().create, 1);
        assert_eq!(gateway.cache().invalidation_count(), 1);
    }

    #[tokio::test]
    async fn test_add_validation() {
        let (gateway, backend) = gateway();
        let mut store = SharedIdentityStore::new();

        let err = gateway.add_line(&mut store, "  ", 1).await.unwrap_err();
        assert!(matches!(err, CartError::Validation(_)));

        let err = gateway.add_line(&mut store, "variant-1", 0).await.unwrap_err();
        assert!(matches!(err, CartError::Validation(_)));

        assert!(store.get().is_none());
        assert_eq!(backend.call_counts(), Default::default());
        assert_eq!(gateway.cache().invalidation_count(), 0);
    }

    #[tokio::test]
    async fn test_quantity_above_backend_int_is_validation() {
        let (gateway, backend) = gateway();
        let mut store = SharedIdentityStore::new();

        let err = gateway
            .add_line(&mut store, "variant-1", MAX_LINE_QUANTITY + 1)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::Validation(_)));
        assert_eq!(backend.call_counts().create, 0);

        gateway.add_line(&mut store, "variant-1", 1).await.unwrap();
        let err = gateway
            .update_line(&mut store, "line-1", "variant-1", u32::MAX)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::Validation(_)));
        assert_eq!(backend.call_counts().update, 0);

        let cart = gateway
            .add_line(&mut store, "variant-1", MAX_LINE_QUANTITY)
            .await
            .unwrap();
        assert_eq!(cart.total_quantity, MAX_LINE_QUANTITY + 1);
    }

    #[tokio::test]
    async fn test_add_recreates_expired_cart() {
        let (gateway, backend) = gateway();
        let mut store = SharedIdentityStore::new();
        let first = gateway.add_line(&mut store, "variant-1", 1).await.unwrap();
        backend.expire_cart(&first.id);

        let second = gateway.add_line(&mut store, "variant-2", 2).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(store.get().unwrap(), second.id);
        assert_eq!(second.total_quantity, 2);
    }

    #[tokio::test]
    async fn test_rejected_add_does_not_invalidate() {
        let (gateway, backend) = gateway();
        let mut store = SharedIdentityStore::new();
        gateway.add_line(&mut store, "variant-1", 1).await.unwrap();
        backend.reject_next_mutation("Only 1 item left in stock");

        let err = gateway.add_line(&mut store, "variant-1", 5).await.unwrap_err();

        assert_eq!(err.user_message(), "Only 1 item left in stock");
        assert_eq!(gateway.cache().invalidation_count(), 1);
        assert_eq!(backend.cart(&store.get().unwrap()).unwrap().total_quantity, 1);
    }

    #[tokio::test]
    async fn test_mutations_without_identity_are_missing_cart() {
        let (gateway, backend) = gateway();
        let mut store = SharedIdentityStore::new();

        let err = gateway
            .update_line(&mut store, "line-1", "v-1", 2)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::MissingCart));

        let err = gateway.remove_line(&mut store, "line-1").await.unwrap_err();
        assert!(matches!(err, CartError::MissingCart));

        let err = gateway.update_note(&mut store, "gift").await.unwrap_err();
        assert!(matches!(err, CartError::MissingCart));

        assert_eq!(backend.call_counts().create, 0);
    }

    #[tokio::test]
    async fn test_update_requires_ids() {
        let (gateway, _) = gateway();
        let mut store = SharedIdentityStore::new();
        gateway.add_line(&mut store, "v-1", 1).await.unwrap();

        let err = gateway.update_line(&mut store, "", "v-1", 2).await.unwrap_err();
        assert!(matches!(err, CartError::Validation(_)));
        let err = gateway.update_line(&mut store, "line-1", "", 2).await.unwrap_err();
        assert!(matches!(err, CartError::Validation(_)));
        let err = gateway.remove_line(&mut store, "").await.unwrap_err();
        assert!(matches!(err, CartError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_to_zero_matches_remove() {
        let (zero_gateway, zero_backend) = gateway();
        let mut zero_store = SharedIdentityStore::new();
        let cart = zero_gateway.add_line(&mut zero_store, "v-1", 2).await.unwrap();
        let line_id = cart.lines[0].id.to_string();
        let after_zero = zero_gateway
            .update_line(&mut zero_store, &line_id, "v-1", 0)
            .await
            .unwrap();

        let (remove_gateway, remove_backend) = gateway();
        let mut remove_store = SharedIdentityStore::new();
        remove_gateway.add_line(&mut remove_store, "v-1", 2).await.unwrap();
        let after_remove = remove_gateway
            .remove_line(&mut remove_store, &line_id)
            .await
            .unwrap();

        assert!(after_zero.lines.iter().all(|l| l.id.as_str() != line_id));
        assert_eq!(after_zero.total_quantity, after_remove.total_quantity);
        assert_eq!(zero_backend.call_counts(), remove_backend.call_counts());
        assert_eq!(zero_backend.call_counts().update, 0);
        assert_eq!(
            zero_gateway.cache().invalidation_count(),
            remove_gateway.cache().invalidation_count()
        );
    }

    #[tokio::test]
    async fn test_update_sets_quantity() {
        let (gateway, _) = gateway();
        let mut store = SharedIdentityStore::new();
        let cart = gateway.add_line(&mut store, "v-1", 1).await.unwrap();
        let line_id = cart.lines[0].id.to_string();

        let cart = gateway.update_line(&mut store, &line_id, "v-1", 3).await.unwrap();

        assert_eq!(cart.total_quantity, 3);
        assert_eq!(cart.lines.len(), 1);
    }

    #[tokio::test]
    async fn test_not_found_forgets_identity() {
        let (gateway, backend) = gateway();
        let mut store = SharedIdentityStore::new();
        let cart = gateway.add_line(&mut store, "v-1", 1).await.unwrap();
        backend.expire_cart(&cart.id);

        let err = gateway.update_note(&mut store, "hello").await.unwrap_err();

        assert!(matches!(err, CartError::NotFound(id) if id == cart.id));
        assert!(store.get().is_none());
    }

    #[tokio::test]
    async fn test_update_note() {
        let (gateway, _) = gateway();
        let mut store = SharedIdentityStore::new();
        gateway.add_line(&mut store, "v-1", 1).await.unwrap();

        let cart = gateway.update_note(&mut store, "Gift wrap please").await.unwrap();
        assert_eq!(cart.note.as_deref(), Some("Gift wrap please"));
    }

    #[tokio::test]
    async fn test_backend_unavailable() {
        let (gateway, backend) = gateway();
        let mut store = SharedIdentityStore::new();
        gateway.add_line(&mut store, "v-1", 1).await.unwrap();
        backend.set_unavailable(true);

        let err = gateway.remove_line(&mut store, "line-1").await.unwrap_err();

        assert!(matches!(err, CartError::BackendUnavailable(_)));
        assert!(store.get().is_some());
    }
}
