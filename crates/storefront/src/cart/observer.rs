//! Reactive cart state for UI surfaces.
//!
//! An observer reads once on mount, then re-reads whenever the update bus
//! fires or the surface regains visibility or focus. The per-variant flavor
//! waits a settle delay after a bus signal so backend eventual consistency
//! has resolved before it reads.
//!
//! Dropping an observer unmounts it: the bus subscription is released and
//! any read still in flight is discarded when it completes.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use storefront_cart_core::MerchandiseId;
use tokio::sync::{mpsc, watch};
use tracing::debug;

use super::backend::CartBackend;
use super::bus::{Subscription, UpdateBus};
use super::identity::IdentityStore;
use super::reader::{CartReader, CartSummary, VariantCartState};

/// Default wait between a bus signal and the variant re-read.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Why an observer should re-read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverSignal {
    /// The update bus fired.
    CartUpdated,
    /// The page became visible again.
    VisibilityRegained,
    /// The window regained focus.
    FocusRegained,
}

/// Observer tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverConfig {
    /// Delay before the per-variant re-read after a bus signal.
    pub settle_delay: Duration,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

/// Reactive holder of one piece of cart state.
pub struct Observer<T> {
    state: watch::Receiver<T>,
    signals: mpsc::UnboundedSender<ObserverSignal>,
    reads: Arc<AtomicUsize>,
    _subscription: Subscription,
}

/// Global cart summary (`hasItems`, `itemCount`).
pub type SummaryObserver = Observer<CartSummary>;

/// In-cart state of one variant (`isInCart`, `quantity`, `lineId`).
pub type VariantObserver = Observer<VariantCartState>;

impl<T> Observer<T>
where
    T: Clone + Default + Send + Sync + 'static,
{
    fn mount<R, Fut>(bus: &UpdateBus, settle_delay: Duration, read: R) -> Self
    where
        R: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        let (state_tx, state_rx) = watch::channel(T::default());
        let (signal_tx, mut signal_rx) = mpsc::unbounded_channel();
        let reads = Arc::new(AtomicUsize::new(0));

        let bus_tx = signal_tx.clone();
        let subscription = bus.subscribe(move |_| {
            // Closed once the observer unmounted.
            let _ = bus_tx.send(ObserverSignal::CartUpdated);
        });

        let counter = Arc::clone(&reads);
        tokio::spawn(async move {
            let value = read().await;
            counter.fetch_add(1, Ordering::SeqCst);
            state_tx.send_replace(value);

            while let Some(signal) = signal_rx.recv().await {
                if signal == ObserverSignal::CartUpdated && !settle_delay.is_zero() {
                    tokio::time::sleep(settle_delay).await;
                }

                let value = read().await;
                counter.fetch_add(1, Ordering::SeqCst);

                if state_tx.is_closed() {
                    debug!(?signal, "Observer unmounted; discarding read");
                    break;
                }
                state_tx.send_replace(value);
            }
        });

        Self {
            state: state_rx,
            signals: signal_tx,
            reads,
            _subscription: subscription,
        }
    }

    /// Latest observed value. The empty value until the mount read lands.
    #[must_use]
    pub fn current(&self) -> T {
        self.state.borrow().clone()
    }

    /// Wait for the next state change. Returns `false` once the observer's
    /// task has stopped.
    pub async fn changed(&mut self) -> bool {
        self.state.changed().await.is_ok()
    }

    /// Request a re-read, as on a visibility or focus event.
    pub fn notify(&self, signal: ObserverSignal) {
        let _ = self.signals.send(signal);
    }

    /// Reads performed so far, including the mount read.
    #[must_use]
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl Observer<CartSummary> {
    /// Mount a summary observer. Bus signals re-read immediately.
    pub fn summary<B, S>(reader: CartReader<B>, identity: S, bus: &UpdateBus) -> Self
    where
        B: CartBackend + Clone + 'static,
        S: IdentityStore + Send + Sync + 'static,
    {
        Self::mount(bus, Duration::ZERO, move || {
            let reader = reader.clone();
            let cart_id = identity.get();
            async move { reader.read_summary(cart_id.as_ref()).await }
        })
    }
}

impl Observer<VariantCartState> {
    /// Mount a per-variant observer. Bus signals re-read after the settle delay.
    pub fn variant<B, S>(
        reader: CartReader<B>,
        identity: S,
        bus: &UpdateBus,
        merchandise_id: MerchandiseId,
        config: ObserverConfig,
    ) -> Self
    where
        B: CartBackend + Clone + 'static,
        S: IdentityStore + Send + Sync + 'static,
    {
        Self::mount(bus, config.settle_delay, move || {
            let reader = reader.clone();
            let cart_id = identity.get();
            let merchandise_id = merchandise_id.clone();
            async move { reader.read_variant(cart_id.as_ref(), &merchandise_id).await }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::cache::CartCache;
    use crate::cart::gateway::CartGateway;
    use crate::cart::identity::SharedIdentityStore;
    use crate::cart::memory::InMemoryCartBackend;

    struct Fixture {
        backend: InMemoryCartBackend,
        gateway: CartGateway<InMemoryCartBackend>,
        reader: CartReader<InMemoryCartBackend>,
        identity: SharedIdentityStore,
        bus: UpdateBus,
    }

    fn fixture() -> Fixture {
        let backend = InMemoryCartBackend::new();
        let cache = CartCache::new(Duration::from_secs(30));
        Fixture {
            gateway: CartGateway::new(backend.clone(), cache.clone()),
            reader: CartReader::new(backend.clone(), cache),
            backend,
            identity: SharedIdentityStore::new(),
            bus: UpdateBus::new(),
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_secs(5)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_mount_without_cookie_is_empty() {
        let f = fixture();
        let observer = SummaryObserver::summary(f.reader.clone(), f.identity.clone(), &f.bus);
        settle().await;

        assert_eq!(observer.read_count(), 1);
        assert_eq!(observer.current(), CartSummary::default());
        assert_eq!(f.backend.call_counts().get, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_summary_rereads_on_publish() {
        let mut f = fixture();
        let mut observer = SummaryObserver::summary(f.reader.clone(), f.identity.clone(), &f.bus);
        assert!(observer.changed().await);
        assert_eq!(observer.current(), CartSummary::default());

        f.gateway.add_line(&mut f.identity, "v-1", 2).await.unwrap();
        f.bus.publish();
        assert!(observer.changed().await);

        let summary = observer.current();
        assert_eq!(summary.total_quantity, 2);
        assert!(summary.has_items());
        assert_eq!(summary.line_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_publish_three_observers_three_rereads() {
        let f = fixture();
        let observers: Vec<_> = (0..3)
            .map(|_| SummaryObserver::summary(f.reader.clone(), f.identity.clone(), &f.bus))
            .collect();
        settle().await;

        f.bus.publish();
        settle().await;

        for observer in &observers {
            assert_eq!(observer.read_count(), 2);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_variant_observer_waits_settle_delay() {
        let mut f = fixture();
        let config = ObserverConfig {
            settle_delay: Duration::from_millis(500),
        };
        let observer = VariantObserver::variant(
            f.reader.clone(),
            f.identity.clone(),
            &f.bus,
            MerchandiseId::parse("v-1").unwrap(),
            config,
        );
        settle().await;

        f.gateway.add_line(&mut f.identity, "v-1", 1).await.unwrap();
        f.bus.publish();

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(observer.read_count(), 1);
        assert!(!observer.current().is_in_cart);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(observer.read_count(), 2);
        let state = observer.current();
        assert!(state.is_in_cart);
        assert_eq!(state.quantity, 1);
        assert_eq!(state.line_id.unwrap().as_str(), "line-1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_focus_and_visibility_reread_immediately() {
        let f = fixture();
        let observer = VariantObserver::variant(
            f.reader.clone(),
            f.identity.clone(),
            &f.bus,
            MerchandiseId::parse("v-1").unwrap(),
            ObserverConfig::default(),
        );
        settle().await;

        observer.notify(ObserverSignal::VisibilityRegained);
        observer.notify(ObserverSignal::FocusRegained);
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert_eq!(observer.read_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_releases_subscription() {
        let f = fixture();
        let observer = VariantObserver::variant(
            f.reader.clone(),
            f.identity.clone(),
            &f.bus,
            MerchandiseId::parse("v-1").unwrap(),
            ObserverConfig::default(),
        );
        assert_eq!(f.bus.subscriber_count(), 1);

        f.bus.publish();
        drop(observer);
        settle().await;

        assert_eq!(f.bus.subscriber_count(), 0);
        assert_eq!(f.bus.publish(), 0);
    }
}
