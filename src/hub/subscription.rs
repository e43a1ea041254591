//! # Subscription: handler + filter bound to a liveness policy.
//!
//! A subscription binds a delivery handler and a filter predicate to a
//! [`ReferenceMode`]:
//!
//! - **Strong**: the hub keeps the handler and filter alive for as long as the
//!   subscription is registered.
//! - **Weak**: the hub holds `Weak` references; once the caller drops its own
//!   `Arc`, the subscription expires and behaves as "do not deliver" until a
//!   registry sweep removes the entry.
//!
//! ## Rules
//! - Weak liveness is re-checked before **every** delivery attempt, never
//!   cached.
//! - A dead weak target at delivery time is a silent no-op, not an error.
//! - A dynamic type mismatch at delivery time indicates registry corruption
//!   and is treated as a fatal internal error.

use std::any::{type_name, Any};
use std::sync::{Arc, Weak};

use tracing::error;

use super::token::TokenId;
use crate::messages::Message;

/// Shared handle to a delivery handler, suitable for weak registration.
pub type HandlerRef<M> = Arc<dyn Fn(&M) + Send + Sync>;

/// Shared handle to a filter predicate, suitable for weak registration.
pub type FilterRef<M> = Arc<dyn Fn(&M) -> bool + Send + Sync>;

/// Whether the hub's hold on a subscriber's handler and filter extends their
/// lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReferenceMode {
    /// The hub keeps the handler and filter alive (default).
    Strong,
    /// The hub observes the handler and filter; their lifetime stays with the
    /// caller. Expired targets turn the subscription into a lazy no-op.
    Weak,
}

/// One registered subscriber, type-erased for registry storage.
///
/// Delivery proxies receive subscriptions through this trait and depend on
/// nothing else; [`deliver`](Subscription::deliver) is the only way a message
/// reaches a handler.
pub trait Subscription: Send + Sync {
    /// Identity of the token issued for this subscription.
    fn token_id(&self) -> TokenId;

    /// Returns `false` once a weak handler or filter target has been
    /// reclaimed. Strong subscriptions are always live.
    fn is_live(&self) -> bool {
        true
    }

    /// Eligibility probe evaluated under the registry lock: dynamic type
    /// match, weak liveness, then the filter predicate.
    fn should_deliver(&self, message: &dyn Message) -> bool;

    /// Invokes the handler with the message.
    ///
    /// A reclaimed weak handler degrades to a no-op. A dynamic type mismatch
    /// panics: entries are keyed by type at registration, so a mismatch here
    /// means the registry is corrupted.
    fn deliver(&self, message: &dyn Message);
}

/// Storage slot for a handler under either reference mode.
pub(crate) enum HandlerSlot<M: Message> {
    Strong(HandlerRef<M>),
    Weak(Weak<dyn Fn(&M) + Send + Sync>),
}

impl<M: Message> HandlerSlot<M> {
    fn get(&self) -> Option<HandlerRef<M>> {
        match self {
            HandlerSlot::Strong(handler) => Some(Arc::clone(handler)),
            HandlerSlot::Weak(weak) => weak.upgrade(),
        }
    }

    fn is_live(&self) -> bool {
        match self {
            HandlerSlot::Strong(_) => true,
            HandlerSlot::Weak(weak) => weak.strong_count() > 0,
        }
    }
}

/// Storage slot for a filter under either reference mode.
pub(crate) enum FilterSlot<M: Message> {
    Strong(FilterRef<M>),
    Weak(Weak<dyn Fn(&M) -> bool + Send + Sync>),
}

impl<M: Message> FilterSlot<M> {
    /// Default filter: every message is eligible.
    pub(crate) fn accept_all() -> Self {
        let accept: FilterRef<M> = Arc::new(|_| true);
        FilterSlot::Strong(accept)
    }

    fn get(&self) -> Option<FilterRef<M>> {
        match self {
            FilterSlot::Strong(filter) => Some(Arc::clone(filter)),
            FilterSlot::Weak(weak) => weak.upgrade(),
        }
    }

    fn is_live(&self) -> bool {
        match self {
            FilterSlot::Strong(_) => true,
            FilterSlot::Weak(weak) => weak.strong_count() > 0,
        }
    }
}

/// The typed subscription stored behind `Arc<dyn Subscription>` in the
/// registry.
pub(crate) struct TypedSubscription<M: Message> {
    id: TokenId,
    mode: ReferenceMode,
    handler: HandlerSlot<M>,
    filter: FilterSlot<M>,
}

impl<M: Message> TypedSubscription<M> {
    pub(crate) fn new(
        id: TokenId,
        mode: ReferenceMode,
        handler: HandlerSlot<M>,
        filter: FilterSlot<M>,
    ) -> Self {
        Self {
            id,
            mode,
            handler,
            filter,
        }
    }

    #[cfg(test)]
    pub(crate) fn mode(&self) -> ReferenceMode {
        self.mode
    }
}

impl<M: Message> Subscription for TypedSubscription<M> {
    fn token_id(&self) -> TokenId {
        self.id
    }

    fn is_live(&self) -> bool {
        match self.mode {
            ReferenceMode::Strong => true,
            ReferenceMode::Weak => self.handler.is_live() && self.filter.is_live(),
        }
    }

    fn should_deliver(&self, message: &dyn Message) -> bool {
        let any: &dyn Any = message;
        let Some(typed) = any.downcast_ref::<M>() else {
            return false;
        };
        if !self.is_live() {
            return false;
        }
        match self.filter.get() {
            Some(filter) => filter(typed),
            None => false,
        }
    }

    fn deliver(&self, message: &dyn Message) {
        let any: &dyn Any = message;
        let Some(typed) = any.downcast_ref::<M>() else {
            error!(
                expected = type_name::<M>(),
                "delivery type mismatch: registry corrupted"
            );
            panic!("delivery type mismatch for {}", type_name::<M>());
        };
        if let Some(handler) = self.handler.get() {
            handler(typed);
        }
    }
}
