//! Cart session synchronization.
//!
//! # Components
//!
//! - [`identity`] - `cartId` cookie holding the backend cart id
//! - [`variant`] - Variant resolution from URL option state
//! - [`gateway`] - Mutations against the backend, cache-tag invalidation
//! - [`reader`] - Null-safe reads (summary, detail, per-variant)
//! - [`observer`] - Reactive per-surface state re-read on signal
//! - [`bus`] - `cart-updated` publish/subscribe and the cross-tab relay
//!
//! # Flow
//!
//! ```text
//! UI action -> CartGateway (identity from IdentityStore) -> backend
//!           -> success: invalidate CacheTag::Cart, UpdateBus::publish
//!           -> observers re-read through CartReader -> surfaces re-render
//! ```

pub mod backend;
pub mod bus;
pub mod cache;
pub mod client;
pub mod error;
pub mod gateway;
pub mod identity;
pub mod memory;
pub mod observer;
pub mod reader;
pub mod variant;

pub use backend::{CartBackend, StoreBackend};
pub use bus::{CART_UPDATED_EVENT, CartEvent, CrossTabRelay, Subscription, UpdateBus};
pub use cache::{CacheTag, CartCache};
pub use client::{CartClient, SubmitGate};
pub use error::CartError;
pub use gateway::{CartGateway, MAX_LINE_QUANTITY};
pub use identity::{
    CART_ID_COOKIE, CookieIdentityStore, CookieSettings, IdentityStore, SharedIdentityStore,
    ensure_identity,
};
pub use memory::InMemoryCartBackend;
pub use observer::{ObserverConfig, ObserverSignal, SummaryObserver, VariantObserver};
pub use reader::{CartDetail, CartReader, CartSummary, VariantCartState};
pub use variant::{SelectedOptionQuery, resolve};
