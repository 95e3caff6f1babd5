//! Client-side mutation flow for one tab.
//!
//! Fire the mutation, publish on success, let observers re-read.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::shopify::types::Cart;

use super::backend::CartBackend;
use super::bus::UpdateBus;
use super::error::CartError;
use super::gateway::CartGateway;
use super::identity::SharedIdentityStore;

/// Mutation entry point used by UI surfaces.
///
/// Publishes on the bus exactly once per successful mutation and never on
/// failure. Errors carry [`CartError::user_message`] for inline display.
#[derive(Clone)]
pub struct CartClient<B> {
    gateway: CartGateway<B>,
    identity: SharedIdentityStore,
    bus: UpdateBus,
}

impl<B: CartBackend> CartClient<B> {
    #[must_use]
    pub const fn new(gateway: CartGateway<B>, identity: SharedIdentityStore, bus: UpdateBus) -> Self {
        Self {
            gateway,
            identity,
            bus,
        }
    }

    #[must_use]
    pub const fn bus(&self) -> &UpdateBus {
        &self.bus
    }

    #[must_use]
    pub const fn identity(&self) -> &SharedIdentityStore {
        &self.identity
    }

    /// Add a variant to the cart.
    ///
    /// # Errors
    ///
    /// See [`CartGateway::add_line`].
    pub async fn add_line(&self, merchandise_id: &str, quantity: u32) -> Result<Cart, CartError> {
        let mut identity = self.identity.clone();
        let result = self
            .gateway
            .add_line(&mut identity, merchandise_id, quantity)
            .await;
        self.announce(result)
    }

    /// Set a line's quantity; zero removes it.
    ///
    /// # Errors
    ///
    /// See [`CartGateway::update_line`].
    pub async fn update_line(
        &self,
        line_id: &str,
        merchandise_id: &str,
        quantity: u32,
    ) -> Result<Cart, CartError> {
        let mut identity = self.identity.clone();
        let result = self
            .gateway
            .update_line(&mut identity, line_id, merchandise_id, quantity)
            .await;
        self.announce(result)
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// See [`CartGateway::remove_line`].
    pub async fn remove_line(&self, line_id: &str) -> Result<Cart, CartError> {
        let mut identity = self.identity.clone();
        let result = self.gateway.remove_line(&mut identity, line_id).await;
        self.announce(result)
    }

    /// Replace the buyer note.
    ///
    /// # Errors
    ///
    /// See [`CartGateway::update_note`].
    pub async fn update_note(&self, note: &str) -> Result<Cart, CartError> {
        let mut identity = self.identity.clone();
        let result = self.gateway.update_note(&mut identity, note).await;
        self.announce(result)
    }

    fn announce(&self, result: Result<Cart, CartError>) -> Result<Cart, CartError> {
        if result.is_ok() {
            self.bus.publish();
        }
        result
    }
}

/// One in-flight submission per form.
///
/// Re-submission while a mutation is pending is refused at the UI boundary;
/// the backend protocol does not deduplicate.
#[derive(Clone, Default)]
pub struct SubmitGate {
    pending: Arc<AtomicBool>,
}

impl SubmitGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a submission is in flight (the control shows as disabled).
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Run `submission` unless one is already pending.
    ///
    /// Returns `None` without polling `submission` when refused.
    pub async fn run<F: Future>(&self, submission: F) -> Option<F::Output> {
        if self
            .pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return None;
        }

        let _release = PendingGuard(&self.pending);
        Some(submission.await)
    }
}

struct PendingGuard<'a>(&'a AtomicBool);

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
