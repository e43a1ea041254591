//! # Per-subscription configuration.
//!
//! [`SubscribeOptions`] collects everything one subscription can customize:
//! the reference mode, a filter predicate and a delivery proxy. Defaults
//! match the plain [`Hub::subscribe`](crate::Hub::subscribe) path: strong
//! references, accept-all filter, direct same-thread delivery.
//!
//! ## Example
//! ```
//! use typebus::{Hub, Message, SubscribeOptions};
//!
//! struct Tick {
//!     n: u32,
//! }
//! impl Message for Tick {}
//!
//! let hub = Hub::new();
//! let token = hub.subscribe_with(
//!     SubscribeOptions::new(|t: &Tick| println!("tick {}", t.n))
//!         .with_filter(|t| t.n % 2 == 0),
//! );
//! hub.publish(Tick { n: 2 });
//! token.release();
//! ```

use std::sync::Arc;

use super::subscription::{FilterRef, FilterSlot, HandlerRef, HandlerSlot, ReferenceMode};
use crate::messages::Message;
use crate::proxies::{DeliveryProxy, DirectProxy};

/// Configuration for one subscription.
///
/// Built with [`new`](SubscribeOptions::new) / [`strong`](SubscribeOptions::strong)
/// / [`weak`](SubscribeOptions::weak), refined with `with_*` methods and
/// passed to [`Hub::subscribe_with`](crate::Hub::subscribe_with).
pub struct SubscribeOptions<M: Message> {
    pub(crate) handler: HandlerSlot<M>,
    pub(crate) filter: FilterSlot<M>,
    pub(crate) proxy: Arc<dyn DeliveryProxy>,
    pub(crate) mode: ReferenceMode,
}

impl<M: Message> SubscribeOptions<M> {
    /// Strong subscription owning the given handler (default mode).
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&M) + Send + Sync + 'static,
    {
        Self::strong(Arc::new(handler))
    }

    /// Strong subscription sharing a pre-allocated handler.
    pub fn strong(handler: HandlerRef<M>) -> Self {
        Self {
            handler: HandlerSlot::Strong(handler),
            filter: FilterSlot::accept_all(),
            proxy: Arc::new(DirectProxy),
            mode: ReferenceMode::Strong,
        }
    }

    /// Weak subscription observing the given handler.
    ///
    /// The hub stores only a `Weak` reference: once the caller drops its
    /// `Arc`, the subscription expires and is swept from the registry on the
    /// next visit. Pair with [`with_weak_filter`](Self::with_weak_filter) when
    /// the filter's lifetime should be tied to the caller as well.
    pub fn weak(handler: &HandlerRef<M>) -> Self {
        Self {
            handler: HandlerSlot::Weak(Arc::downgrade(handler)),
            filter: FilterSlot::accept_all(),
            proxy: Arc::new(DirectProxy),
            mode: ReferenceMode::Weak,
        }
    }

    /// Sets a filter predicate owned by the subscription.
    ///
    /// Filters run under the registry lock and must be pure: no hub
    /// re-entry, no blocking.
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&M) -> bool + Send + Sync + 'static,
    {
        self.filter = FilterSlot::Strong(Arc::new(filter));
        self
    }

    /// Sets a weakly-held filter predicate.
    ///
    /// The same purity rules as [`with_filter`](Self::with_filter) apply; in
    /// addition the subscription stops delivering once the caller drops its
    /// `Arc` to the filter.
    pub fn with_weak_filter(mut self, filter: &FilterRef<M>) -> Self {
        self.filter = FilterSlot::Weak(Arc::downgrade(filter));
        self
    }

    /// Routes deliveries through the given proxy instead of the default
    /// same-thread [`DirectProxy`].
    pub fn with_proxy(mut self, proxy: Arc<dyn DeliveryProxy>) -> Self {
        self.proxy = proxy;
        self
    }

    /// Reference mode this subscription will be registered with.
    pub fn reference_mode(&self) -> ReferenceMode {
        self.mode
    }
}
