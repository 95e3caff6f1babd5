//! Short-lived cart read cache with named invalidation tags.
//!
//! Reads go through the cache; every successful mutation drops the whole
//! [`CacheTag::Cart`] tag so the next read hits the backend.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::future::Cache;
use storefront_cart_core::CartId;
use tracing::{debug, warn};

use crate::shopify::types::Cart;

/// Named group of cache entries invalidated together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheTag {
    /// Cart reads, keyed by cart id.
    Cart,
}

impl CacheTag {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cart => "cart",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    tag: CacheTag,
    key: String,
}

/// Tagged cache of backend cart reads.
///
/// `None` values record that the backend has no cart for the id.
#[derive(Clone)]
pub struct CartCache {
    entries: Cache<CacheKey, Option<Cart>>,
    invalidations: Arc<AtomicU64>,
}

impl CartCache {
    /// Create a cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let entries = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(ttl)
            .support_invalidation_closures()
            .build();

        Self {
            entries,
            invalidations: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Cached read for a cart, if present.
    pub async fn get_cart(&self, cart_id: &CartId) -> Option<Option<Cart>> {
        self.entries.get(&cart_key(cart_id)).await
    }

    /// Store a backend read.
    pub async fn insert_cart(&self, cart_id: &CartId, cart: Option<Cart>) {
        self.entries.insert(cart_key(cart_id), cart).await;
    }

    /// Drop every entry carrying `tag`.
    pub fn invalidate_tag(&self, tag: CacheTag) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);

        if let Err(e) = self.entries.invalidate_entries_if(move |k, _| k.tag == tag) {
            warn!(tag = tag.as_str(), error = %e, "Tag invalidation failed; clearing cache");
            self.entries.invalidate_all();
            return;
        }
        debug!(tag = tag.as_str(), "Invalidated cache tag");
    }

    /// Number of tag invalidations performed.
    #[must_use]
    pub fn invalidation_count(&self) -> u64 {
        self.invalidations.load(Ordering::Relaxed)
    }
}

fn cart_key(cart_id: &CartId) -> CacheKey {
    CacheKey {
        tag: CacheTag::Cart,
        key: cart_id.to_string(),
    }
}
