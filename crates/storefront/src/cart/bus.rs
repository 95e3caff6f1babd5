//! Cart update broadcast.
//!
//! - One signal, [`CART_UPDATED_EVENT`], published once per successful mutation
//! - Synchronous dispatch in subscription order, same tab
//! - Subscriptions unsubscribe when dropped
//! - Cross-tab fan-out through [`CrossTabRelay`] is best-effort only

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::debug;

/// Name of the update signal. Also sent as the `HX-Trigger` header value.
pub const CART_UPDATED_EVENT: &str = "cart-updated";

/// Default capacity of the cross-tab channel.
const RELAY_CAPACITY: usize = 64;

/// Identifies one tab (one bus) in a browser profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TabId(u64);

impl TabId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A cart update signal. Carries nothing observers need beyond "changed".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartEvent {
    pub name: &'static str,
    pub origin: TabId,
}

type Handler = Arc<dyn Fn(&CartEvent) + Send + Sync>;

struct BusState {
    next_id: u64,
    handlers: Vec<(u64, Handler)>,
    relay: Option<broadcast::Sender<CartEvent>>,
}

struct BusInner {
    tab: TabId,
    state: Mutex<BusState>,
}

impl BusInner {
    fn state(&self) -> MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Process-local publish/subscribe for cart updates. One bus per tab.
#[derive(Clone)]
pub struct UpdateBus {
    inner: Arc<BusInner>,
}

impl Default for UpdateBus {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                tab: TabId::next(),
                state: Mutex::new(BusState {
                    next_id: 0,
                    handlers: Vec::new(),
                    relay: None,
                }),
            }),
        }
    }

    /// This bus's tab.
    #[must_use]
    pub fn tab(&self) -> TabId {
        self.inner.tab
    }

    /// Register `handler` for every publish until the subscription drops.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&CartEvent) + Send + Sync + 'static,
    {
        let mut state = self.inner.state();
        let id = state.next_id;
        state.next_id += 1;
        state.handlers.push((id, Arc::new(handler)));

        Subscription {
            bus: Arc::downgrade(&self.inner),
            id,
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.state().handlers.len()
    }

    /// Signal that the cart changed. Returns the number of handlers invoked.
    pub fn publish(&self) -> usize {
        let event = CartEvent {
            name: CART_UPDATED_EVENT,
            origin: self.inner.tab,
        };
        let delivered = self.deliver(&event);

        let relay = self.inner.state().relay.clone();
        if let Some(relay) = relay {
            // No other tab listening is fine.
            let _ = relay.send(event);
        }
        delivered
    }

    /// Invoke every handler in subscription order, outside the lock so
    /// handlers may subscribe or unsubscribe.
    fn deliver(&self, event: &CartEvent) -> usize {
        let handlers: Vec<Handler> = self
            .inner
            .state()
            .handlers
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }
}

/// Live registration on an [`UpdateBus`]. Dropping it unsubscribes.
#[must_use = "dropping a subscription unsubscribes immediately"]
pub struct Subscription {
    bus: Weak<BusInner>,
    id: u64,
}

impl Subscription {
    /// Release the subscription explicitly.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.state().handlers.retain(|(id, _)| *id != self.id);
        }
    }
}

/// Best-effort fan-out of updates between tabs of one browser profile.
///
/// Lagged receivers skip the missed events; observers also re-read on focus
/// and visibility, so nothing depends on the relay alone.
#[derive(Clone)]
pub struct CrossTabRelay {
    sender: broadcast::Sender<CartEvent>,
}

impl Default for CrossTabRelay {
    fn default() -> Self {
        Self::new()
    }
}

impl CrossTabRelay {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(RELAY_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Connect a tab's bus.
    ///
    /// Local publishes are forwarded to other tabs; events from other tabs
    /// are delivered to the bus's handlers. The returned task ends when the
    /// bus is dropped or the relay closes.
    pub fn attach(&self, bus: &UpdateBus) -> JoinHandle<()> {
        bus.inner.state().relay = Some(self.sender.clone());

        let mut receiver = self.sender.subscribe();
        let weak = Arc::downgrade(&bus.inner);
        let tab = bus.tab();

        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) if event.origin == tab => {}
                    Ok(event) => {
                        let Some(inner) = weak.upgrade() else { break };
                        UpdateBus { inner }.deliver(&event);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Cross-tab relay lagged; skipping events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}
