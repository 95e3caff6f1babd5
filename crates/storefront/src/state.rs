//! Application state shared across handlers.

use std::sync::Arc;

use axum::extract::FromRef;

use crate::cart::{
    CartCache, CartGateway, CartReader, CookieSettings, InMemoryCartBackend, StoreBackend,
};
use crate::config::StorefrontConfig;
use crate::shopify::StorefrontClient;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the configuration, the commerce backend, and the cart layer.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    backend: StoreBackend,
    gateway: CartGateway<StoreBackend>,
    reader: CartReader<StoreBackend>,
}

impl AppState {
    /// Create application state, selecting the backend from configuration.
    ///
    /// Without Shopify credentials the in-memory backend is used.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let backend = config.shopify.as_ref().map_or_else(
            || StoreBackend::Memory(InMemoryCartBackend::new()),
            |shopify| StoreBackend::Shopify(StorefrontClient::new(shopify)),
        );
        Self::with_backend(config, backend)
    }

    /// Create application state over an explicit backend.
    #[must_use]
    pub fn with_backend(config: StorefrontConfig, backend: StoreBackend) -> Self {
        let cache = CartCache::new(config.cart.cache_ttl);

        Self {
            inner: Arc::new(AppStateInner {
                gateway: CartGateway::new(backend.clone(), cache.clone()),
                reader: CartReader::new(backend.clone(), cache),
                backend,
                config,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the commerce backend.
    #[must_use]
    pub fn backend(&self) -> &StoreBackend {
        &self.inner.backend
    }

    /// Get a reference to the cart mutation gateway.
    #[must_use]
    pub fn gateway(&self) -> &CartGateway<StoreBackend> {
        &self.inner.gateway
    }

    /// Get a reference to the cart read facade.
    #[must_use]
    pub fn reader(&self) -> &CartReader<StoreBackend> {
        &self.inner.reader
    }
}

impl FromRef<AppState> for CookieSettings {
    fn from_ref(state: &AppState) -> Self {
        Self {
            secure: state.config().secure_cookies(),
        }
    }
}
