//! # Proxy trait and the default same-thread implementation.

use std::sync::Arc;

use crate::hub::Subscription;
use crate::messages::Message;

/// Indirection point between the hub's fan-out loop and a handler.
///
/// Called once per eligible (message, subscription) pair during a publish.
/// Implementations decide how and where
/// [`Subscription::deliver`](crate::Subscription::deliver) runs: inline, on
/// another thread, after a delay — the hub does not care.
///
/// A proxy that defers execution takes ownership of both `Arc`s and may
/// outlive the publish call that handed them over.
pub trait DeliveryProxy: Send + Sync {
    /// Delivers `message` to `subscription`.
    fn deliver(&self, message: Arc<dyn Message>, subscription: Arc<dyn Subscription>);
}

/// Default proxy: immediate delivery on the publishing thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectProxy;

impl DeliveryProxy for DirectProxy {
    fn deliver(&self, message: Arc<dyn Message>, subscription: Arc<dyn Subscription>) {
        subscription.deliver(message.as_ref());
    }
}
