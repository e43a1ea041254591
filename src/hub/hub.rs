//! # The hub: type-routed subscribe/unsubscribe/publish pipeline.
//!
//! [`Hub`] owns the subscription registry and drives delivery fan-out.
//!
//! ## Architecture
//! ```text
//! publish(msg)
//!     │ lock ── sweep dead entries, evaluate filters, copy snapshot ── unlock
//!     ▼
//! for each (proxy, subscription) in snapshot (subscribe order):
//!     proxy.deliver(msg, subscription)
//!         │                 └─► panic → caught, counted, hook, warn!
//!         └─► DirectProxy: handler runs here
//!             MarshalProxy: handler runs on its dispatch context
//! ```
//!
//! ## Rules
//! - The registry lock never covers handler invocation: handlers may call
//!   subscribe/unsubscribe/publish re-entrantly without deadlocking.
//! - A panicking subscriber is contained at the per-entry boundary: it never
//!   interrupts fan-out to later entries and never reaches the publisher.
//!   Contained failures are observable via [`Hub::failed_delivery_count`],
//!   `tracing` warnings and the optional
//!   [`on_delivery_error`](HubBuilder::on_delivery_error) hook.
//! - `publish` returns once every eligible subscriber has been handed to its
//!   proxy; a deferring proxy may still be running handlers afterwards.
//! - No ordering exists across distinct publish calls or distinct message
//!   types; within one call, delivery follows subscribe order.

use std::any::{type_name, Any, TypeId};
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::FutureExt;
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use super::options::SubscribeOptions;
use super::registry::{Entry, Registry};
use super::subscription::TypedSubscription;
use super::token::{SubscriptionToken, TokenId};
use crate::error::{panic_reason, PublishError};
use crate::messages::Message;

/// Details of one contained delivery failure, passed to the
/// [`on_delivery_error`](HubBuilder::on_delivery_error) hook.
#[derive(Debug)]
pub struct DeliveryFailure {
    /// Name of the message type being delivered.
    pub message_type: &'static str,
    /// Extracted panic payload, best effort.
    pub reason: String,
}

type DeliveryErrorHook = Arc<dyn Fn(&DeliveryFailure) + Send + Sync>;

/// Shared state behind every [`Hub`] clone.
pub(crate) struct HubShared {
    registry: Registry,
    published: AtomicU64,
    failed_deliveries: AtomicU64,
    on_delivery_error: Option<DeliveryErrorHook>,
}

impl HubShared {
    /// Removes every entry of the type whose token matches. No-op when
    /// nothing matches.
    pub(crate) fn remove_subscription(
        &self,
        type_id: TypeId,
        type_name: &'static str,
        id: TokenId,
    ) -> usize {
        let removed = self.registry.remove(type_id, id);
        if removed > 0 {
            debug!(message_type = type_name, token = id.0, "subscription released");
        }
        removed
    }
}

/// Builder for a [`Hub`] with optional diagnostics.
pub struct HubBuilder {
    on_delivery_error: Option<DeliveryErrorHook>,
}

impl HubBuilder {
    /// Creates a builder with no hook installed.
    pub fn new() -> Self {
        Self {
            on_delivery_error: None,
        }
    }

    /// Installs a hook observing every contained delivery failure.
    ///
    /// The hook runs inside the publish fan-out loop and must not panic.
    pub fn on_delivery_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&DeliveryFailure) + Send + Sync + 'static,
    {
        self.on_delivery_error = Some(Arc::new(hook));
        self
    }

    /// Builds the hub.
    pub fn build(self) -> Hub {
        Hub {
            shared: Arc::new(HubShared {
                registry: Registry::new(),
                published: AtomicU64::new(0),
                failed_deliveries: AtomicU64::new(0),
                on_delivery_error: self.on_delivery_error,
            }),
        }
    }
}

impl Default for HubBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Type-routed in-process publish/subscribe hub.
///
/// Cheap to clone: clones share one registry. Subscribers register interest
/// in a concrete message type; publishers deliver instances of that type to
/// every currently-eligible subscription without either side holding a
/// reference to the other.
///
/// # Example
/// ```
/// use typebus::{Hub, Message};
///
/// struct Ping {
///     value: i32,
/// }
/// impl Message for Ping {}
///
/// let hub = Hub::new();
/// let token = hub.subscribe(|p: &Ping| println!("ping {}", p.value));
///
/// hub.publish(Ping { value: 1 });
/// token.release();
/// hub.publish(Ping { value: 2 }); // nobody listens anymore
/// ```
#[derive(Clone)]
pub struct Hub {
    shared: Arc<HubShared>,
}

impl Hub {
    /// Creates a hub with default settings.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Returns a [`HubBuilder`] for hubs with diagnostics attached.
    pub fn builder() -> HubBuilder {
        HubBuilder::new()
    }

    /// Registers a strong subscription with an accept-all filter and direct
    /// same-thread delivery.
    ///
    /// Returns the token identifying the subscription; keep it if the
    /// subscription should ever be released. Dropping the token does **not**
    /// unsubscribe — see [`SubscriptionToken::into_scoped`] for RAII release.
    pub fn subscribe<M, F>(&self, handler: F) -> SubscriptionToken
    where
        M: Message,
        F: Fn(&M) + Send + Sync + 'static,
    {
        self.subscribe_with(SubscribeOptions::new(handler))
    }

    /// Registers a subscription with explicit options (reference mode,
    /// filter, delivery proxy).
    pub fn subscribe_with<M: Message>(&self, options: SubscribeOptions<M>) -> SubscriptionToken {
        let id = TokenId::next();
        let mode = options.reference_mode();
        let subscription = Arc::new(TypedSubscription::new(
            id,
            mode,
            options.handler,
            options.filter,
        ));
        self.shared.registry.insert(
            TypeId::of::<M>(),
            Entry {
                proxy: options.proxy,
                subscription,
            },
        );
        debug!(
            message_type = type_name::<M>(),
            token = id.0,
            mode = ?mode,
            "subscription registered"
        );
        SubscriptionToken {
            hub: Arc::downgrade(&self.shared),
            type_id: TypeId::of::<M>(),
            type_name: type_name::<M>(),
            id,
        }
    }

    /// Removes the token's subscription from this hub.
    ///
    /// Unknown tokens (already removed, issued by another hub) are a silent
    /// no-op, never an error. Equivalent to [`SubscriptionToken::release`]
    /// when the token came from this hub.
    pub fn unsubscribe(&self, token: &SubscriptionToken) {
        self.shared
            .remove_subscription(token.type_id, token.type_name, token.id);
    }

    /// Delivers `message` to every eligible subscription of its type, in
    /// subscribe order.
    ///
    /// Blocks until each eligible subscription has been handed to its proxy.
    /// With zero subscribers this is a no-op. Per-subscriber panics are
    /// contained and recorded; they never reach the caller.
    pub fn publish<M: Message>(&self, message: M) {
        let message: Arc<dyn Message> = Arc::new(message);
        self.publish_erased(message, TypeId::of::<M>(), type_name::<M>());
    }

    /// Schedules a full publish pass onto the ambient Tokio runtime and
    /// returns immediately.
    ///
    /// The returned [`Completion`] resolves once the pass has run; dropping
    /// it is fine when nobody cares. No ordering is established between two
    /// independent `publish_async` calls, even for the same message type.
    ///
    /// # Panics
    /// Panics when called outside a Tokio runtime.
    pub fn publish_async<M: Message>(&self, message: M) -> Completion {
        let (done, completion) = oneshot::channel();
        let hub = self.clone();
        let message: Arc<dyn Message> = Arc::new(message);
        let type_id = TypeId::of::<M>();
        let message_type = type_name::<M>();

        tokio::spawn(async move {
            let pass =
                AssertUnwindSafe(async move { hub.publish_erased(message, type_id, message_type) });
            let result = match pass.catch_unwind().await {
                Ok(()) => Ok(()),
                Err(payload) => Err(PublishError::Panicked {
                    reason: panic_reason(payload.as_ref()),
                }),
            };
            let _ = done.send(result);
        });

        Completion { inner: completion }
    }

    /// Number of entries currently registered for `M`.
    ///
    /// May include expired weak entries that no sweep has visited yet.
    pub fn subscription_count<M: Message>(&self) -> usize {
        self.shared.registry.count(TypeId::of::<M>())
    }

    /// Total publish calls handled by this hub.
    pub fn published_count(&self) -> u64 {
        self.shared.published.load(Ordering::Relaxed)
    }

    /// Total contained delivery failures.
    pub fn failed_delivery_count(&self) -> u64 {
        self.shared.failed_deliveries.load(Ordering::Relaxed)
    }

    fn publish_erased(
        &self,
        message: Arc<dyn Message>,
        type_id: TypeId,
        message_type: &'static str,
    ) {
        self.shared.published.fetch_add(1, Ordering::Relaxed);

        let snapshot = self.shared.registry.snapshot_for(type_id, message.as_ref());
        if snapshot.is_empty() {
            return;
        }
        trace!(message_type, eligible = snapshot.len(), "publishing");

        for entry in snapshot {
            let Entry {
                proxy,
                subscription,
            } = entry;
            let msg = Arc::clone(&message);
            let outcome = catch_unwind(AssertUnwindSafe(move || proxy.deliver(msg, subscription)));
            if let Err(payload) = outcome {
                self.report_delivery_failure(message_type, payload.as_ref());
            }
        }
    }

    fn report_delivery_failure(&self, message_type: &'static str, payload: &(dyn Any + Send)) {
        let reason = panic_reason(payload);
        self.shared.failed_deliveries.fetch_add(1, Ordering::Relaxed);
        warn!(
            message_type,
            %reason,
            "subscriber delivery panicked; fan-out continues"
        );
        if let Some(hook) = &self.shared.on_delivery_error {
            hook(&DeliveryFailure {
                message_type,
                reason,
            });
        }
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("published", &self.published_count())
            .field("failed_deliveries", &self.failed_delivery_count())
            .finish()
    }
}

/// Future resolving once a scheduled publish pass has finished.
///
/// Returned by [`Hub::publish_async`]. Resolves to `Ok(())` when the pass ran
/// to completion (contained per-subscriber failures included — those surface
/// through the hub's diagnostics, not here), or to a [`PublishError`] when
/// the pass itself panicked or was dropped by the runtime before running.
#[derive(Debug)]
pub struct Completion {
    inner: oneshot::Receiver<Result<(), PublishError>>,
}

impl Future for Completion {
    type Output = Result<(), PublishError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.inner).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(PublishError::Aborted)),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    use super::*;
    use crate::hub::subscription::HandlerRef;

    struct Ping {
        value: i32,
    }
    impl Message for Ping {}

    struct Pong;
    impl Message for Pong {}

    #[test]
    fn test_fanout_in_subscribe_order() {
        // Scenario A: h1 then h2, one publish, call order [h1, h2].
        let hub = Hub::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let o1 = Arc::clone(&order);
        let _t1 = hub.subscribe(move |_: &Ping| o1.lock().unwrap().push("h1"));
        let o2 = Arc::clone(&order);
        let _t2 = hub.subscribe(move |_: &Ping| o2.lock().unwrap().push("h2"));

        hub.publish(Ping { value: 1 });
        assert_eq!(*order.lock().unwrap(), vec!["h1", "h2"]);
    }

    #[test]
    fn test_released_token_stops_delivery() {
        // Scenario B: release then publish; handler never runs again.
        let hub = Hub::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = Arc::clone(&hits);
        let token = hub.subscribe(move |_: &Ping| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        hub.publish(Ping { value: 1 });
        token.release();
        hub.publish(Ping { value: 2 });
        token.release(); // second release is a no-op

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(hub.subscription_count::<Ping>(), 0);
    }

    #[test]
    fn test_filter_suppresses_only_failing_instances() {
        // Scenario C: value > 0 filter.
        let hub = Hub::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = Arc::clone(&hits);
        let _token = hub.subscribe_with(
            SubscribeOptions::new(move |_: &Ping| {
                h.fetch_add(1, Ordering::SeqCst);
            })
            .with_filter(|p| p.value > 0),
        );

        hub.publish(Ping { value: -1 });
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        hub.publish(Ping { value: 5 });
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_publish_async_completion() {
        // Scenario D: publish_async returns immediately; after awaiting the
        // completion the handler has run exactly once.
        let hub = Hub::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = Arc::clone(&hits);
        let _token = hub.subscribe(move |_: &Ping| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        let completion = hub.publish_async(Ping { value: 1 });
        completion.await.expect("scheduled publish completes");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panicking_subscriber_is_contained() {
        let hub = Hub::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let _bad = hub.subscribe(|_: &Ping| panic!("bad subscriber"));
        let h = Arc::clone(&hits);
        let _good = hub.subscribe(move |_: &Ping| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        hub.publish(Ping { value: 1 });

        assert_eq!(hits.load(Ordering::SeqCst), 1, "later subscriber still runs");
        assert_eq!(hub.failed_delivery_count(), 1);
        assert_eq!(
            hub.subscription_count::<Ping>(),
            2,
            "failing subscriber is not auto-unsubscribed"
        );
    }

    #[test]
    fn test_delivery_error_hook_observes_failures() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let hub = Hub::builder()
            .on_delivery_error(move |failure| {
                sink.lock()
                    .unwrap()
                    .push((failure.message_type, failure.reason.clone()));
            })
            .build();

        let _bad = hub.subscribe(|_: &Ping| panic!("boom"));
        hub.publish(Ping { value: 1 });

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].0.contains("Ping"));
        assert_eq!(seen[0].1, "boom");
    }

    #[test]
    fn test_publish_with_no_subscribers_is_noop() {
        let hub = Hub::new();
        hub.publish(Ping { value: 1 });
        assert_eq!(hub.published_count(), 1);
        assert_eq!(hub.failed_delivery_count(), 0);
        assert_eq!(hub.subscription_count::<Ping>(), 0);
    }

    #[test]
    fn test_handler_may_reenter_hub() {
        let hub = Hub::new();
        let nested_hits = Arc::new(AtomicUsize::new(0));

        let reentrant = hub.clone();
        let nested = Arc::clone(&nested_hits);
        let _outer = hub.subscribe(move |_: &Ping| {
            // subscribe + publish from inside a handler: the registry lock is
            // released before fan-out, so neither call deadlocks
            let inner = Arc::clone(&nested);
            let _token = reentrant.subscribe(move |_: &Pong| {
                inner.fetch_add(1, Ordering::SeqCst);
            });
            reentrant.publish(Pong);
        });

        hub.publish(Ping { value: 1 });
        assert_eq!(nested_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_snapshot_excludes_subscriptions_added_mid_publish() {
        let hub = Hub::new();
        let late_hits = Arc::new(AtomicUsize::new(0));

        let reentrant = hub.clone();
        let late = Arc::clone(&late_hits);
        let _outer = hub.subscribe(move |_: &Ping| {
            let inner = Arc::clone(&late);
            let _token = reentrant.subscribe(move |_: &Ping| {
                inner.fetch_add(1, Ordering::SeqCst);
            });
        });

        hub.publish(Ping { value: 1 });
        assert_eq!(
            late_hits.load(Ordering::SeqCst),
            0,
            "subscription added during publish misses the in-flight message"
        );

        hub.publish(Ping { value: 2 });
        assert_eq!(late_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_weak_subscription_expires_and_sweeps() {
        let hub = Hub::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = Arc::clone(&hits);
        let handler: HandlerRef<Ping> = Arc::new(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        let _token = hub.subscribe_with(SubscribeOptions::weak(&handler));

        hub.publish(Ping { value: 1 });
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        drop(handler);
        hub.publish(Ping { value: 2 });
        assert_eq!(hits.load(Ordering::SeqCst), 1, "expired weak handler skipped");
        assert_eq!(hub.subscription_count::<Ping>(), 0, "dead entry swept");
    }

    #[test]
    fn test_unsubscribe_via_hub_matches_token_release() {
        let hub = Hub::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = Arc::clone(&hits);
        let token = hub.subscribe(move |_: &Ping| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        hub.unsubscribe(&token);
        hub.publish(Ping { value: 1 });
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        // releasing after hub-side unsubscribe stays a no-op
        token.release();
    }

    #[test]
    fn test_scoped_token_releases_on_drop() {
        let hub = Hub::new();
        let hits = Arc::new(AtomicUsize::new(0));

        {
            let h = Arc::clone(&hits);
            let _scoped = hub
                .subscribe(move |_: &Ping| {
                    h.fetch_add(1, Ordering::SeqCst);
                })
                .into_scoped();
            hub.publish(Ping { value: 1 });
        }

        hub.publish(Ping { value: 2 });
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(hub.subscription_count::<Ping>(), 0);
    }

    #[test]
    fn test_scoped_token_forget_keeps_subscription() {
        let hub = Hub::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let token = {
            let h = Arc::clone(&hits);
            let scoped = hub
                .subscribe(move |_: &Ping| {
                    h.fetch_add(1, Ordering::SeqCst);
                })
                .into_scoped();
            scoped.forget()
        };

        hub.publish(Ping { value: 1 });
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        token.release();
    }

    #[test]
    fn test_distinct_types_are_independent() {
        let hub = Hub::new();
        let ping_hits = Arc::new(AtomicUsize::new(0));
        let pong_hits = Arc::new(AtomicUsize::new(0));

        let p = Arc::clone(&ping_hits);
        let _t1 = hub.subscribe(move |_: &Ping| {
            p.fetch_add(1, Ordering::SeqCst);
        });
        let q = Arc::clone(&pong_hits);
        let _t2 = hub.subscribe(move |_: &Pong| {
            q.fetch_add(1, Ordering::SeqCst);
        });

        hub.publish(Ping { value: 1 });
        assert_eq!(ping_hits.load(Ordering::SeqCst), 1);
        assert_eq!(pong_hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_completion_reports_aborted_when_dropped() {
        let (tx, rx) = oneshot::channel();
        let completion = Completion { inner: rx };
        drop(tx);

        let err = completion.await.expect_err("sender dropped");
        assert_eq!(err.as_label(), "publish_aborted");
    }
}
