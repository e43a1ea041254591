//! # Context-marshalling proxy.
//!
//! [`MarshalProxy`] moves handler invocation onto a designated execution
//! context — a UI loop, a dedicated worker, any [`Dispatch`] implementation —
//! without the hub knowing. When the publisher is already on the target
//! context the handler runs synchronously; otherwise the delivery is queued
//! and the publish call returns without waiting for it.

use std::sync::Arc;

use crate::dispatch::Dispatch;
use crate::hub::Subscription;
use crate::messages::Message;

use super::proxy::DeliveryProxy;

/// Proxy delivering on a [`Dispatch`] context.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use typebus::{ContextDispatcher, Hub, MarshalProxy, Message, SubscribeOptions};
///
/// struct Redraw;
/// impl Message for Redraw {}
///
/// # async fn demo() {
/// let hub = Hub::new();
/// let ui = ContextDispatcher::spawn();
/// let _token = hub.subscribe_with(
///     SubscribeOptions::new(|_: &Redraw| { /* touch UI state */ })
///         .with_proxy(Arc::new(MarshalProxy::new(ui))),
/// );
/// hub.publish(Redraw); // handler runs on the dispatcher's context
/// # }
/// ```
pub struct MarshalProxy {
    dispatch: Arc<dyn Dispatch>,
}

impl MarshalProxy {
    /// Creates a proxy marshalling onto `dispatch`.
    pub fn new(dispatch: Arc<dyn Dispatch>) -> Self {
        Self { dispatch }
    }
}

impl DeliveryProxy for MarshalProxy {
    fn deliver(&self, message: Arc<dyn Message>, subscription: Arc<dyn Subscription>) {
        if self.dispatch.is_on_context() {
            subscription.deliver(message.as_ref());
            return;
        }
        self.dispatch
            .post(Box::new(move || subscription.deliver(message.as_ref())));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::dispatch::ContextDispatcher;
    use crate::hub::{Hub, SubscribeOptions};

    struct Probe;
    impl Message for Probe {}

    #[tokio::test]
    async fn test_marshal_proxy_delivers_on_context() {
        let hub = Hub::new();
        let dispatcher = ContextDispatcher::spawn();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = Arc::clone(&hits);
        let probe_ctx = Arc::clone(&dispatcher);
        let _token = hub.subscribe_with(
            SubscribeOptions::new(move |_: &Probe| {
                assert!(
                    probe_ctx.is_on_context(),
                    "handler must run on the dispatch context"
                );
                h.fetch_add(1, Ordering::SeqCst);
            })
            .with_proxy(Arc::new(MarshalProxy::new(
                Arc::clone(&dispatcher) as Arc<dyn Dispatch>
            ))),
        );

        // publish hands off without waiting for the queued delivery
        hub.publish(Probe);

        // drain the context: a follow-up job observes the delivery already ran
        let observed = Arc::clone(&hits);
        dispatcher
            .run(Box::new(move || {
                assert_eq!(observed.load(Ordering::SeqCst), 1);
            }))
            .await
            .expect("dispatcher alive");

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        dispatcher.shutdown().await;
    }

    #[tokio::test]
    async fn test_marshal_proxy_is_synchronous_on_context() {
        let hub = Hub::new();
        let dispatcher = ContextDispatcher::spawn();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = Arc::clone(&hits);
        let _token = hub.subscribe_with(
            SubscribeOptions::new(move |_: &Probe| {
                h.fetch_add(1, Ordering::SeqCst);
            })
            .with_proxy(Arc::new(MarshalProxy::new(
                Arc::clone(&dispatcher) as Arc<dyn Dispatch>
            ))),
        );

        // publish from a job already running on the target context: delivery
        // happens inline, before the job returns
        let observed = Arc::clone(&hits);
        let publisher = hub.clone();
        dispatcher
            .run(Box::new(move || {
                publisher.publish(Probe);
                assert_eq!(observed.load(Ordering::SeqCst), 1, "inline delivery");
            }))
            .await
            .expect("dispatcher alive");

        dispatcher.shutdown().await;
        // queue was never involved, so no further deliveries appear
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
