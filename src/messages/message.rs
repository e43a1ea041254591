//! # Message trait and the weakly-held sender handle.
//!
//! A message is any `'static + Send + Sync` value; the hub routes it by its
//! concrete type. Implementing [`Message`] is a one-liner:
//!
//! ```
//! use typebus::Message;
//!
//! struct Ping {
//!     value: i32,
//! }
//!
//! impl Message for Ping {}
//! # let _ = Ping { value: 1 };
//! ```
//!
//! A message may carry a [`SenderRef`] back to whatever produced it. The
//! reference is weak: holding a message never extends its originator's
//! lifetime, and resolving the sender after the originator was dropped yields
//! `None`.

use std::any::Any;
use std::sync::{Arc, Weak};

/// A typed value broadcast through the hub.
///
/// The hub keys its registry on the implementor's [`TypeId`](std::any::TypeId),
/// so each concrete message type forms its own delivery channel. Messages are
/// created per publish call and never retained by the hub beyond one publish
/// cycle.
pub trait Message: Any + Send + Sync {
    /// Returns a weak handle to the object that produced this message.
    ///
    /// The default is `None`: most messages do not carry an originator.
    /// [`Envelope`](crate::Envelope) sets it when built via
    /// [`Envelope::from_sender`](crate::Envelope::from_sender).
    fn sender(&self) -> Option<&SenderRef> {
        None
    }
}

/// Weakly-held reference to a message's originator.
///
/// Wraps a `Weak<dyn Any + Send + Sync>`, so the originator can be any shared
/// object. The handle never keeps the originator alive; once the last strong
/// reference is gone, [`upgrade`](SenderRef::upgrade) resolves to `None`.
#[derive(Clone)]
pub struct SenderRef {
    inner: Weak<dyn Any + Send + Sync>,
}

impl SenderRef {
    /// Creates a sender handle from a shared originator.
    pub fn of<S>(sender: &Arc<S>) -> Self
    where
        S: Any + Send + Sync,
    {
        let sender: Arc<dyn Any + Send + Sync> = sender.clone();
        let weak: Weak<dyn Any + Send + Sync> = Arc::downgrade(&sender);
        Self { inner: weak }
    }

    /// Attempts to resolve the originator.
    ///
    /// Returns `None` when the originator has been dropped.
    pub fn upgrade(&self) -> Option<Arc<dyn Any + Send + Sync>> {
        self.inner.upgrade()
    }

    /// Returns `true` while the originator is still alive.
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    /// Resolves the originator and downcasts it to a concrete type.
    ///
    /// Returns `None` when the originator has been dropped **or** is of a
    /// different type.
    pub fn downcast<S>(&self) -> Option<Arc<S>>
    where
        S: Any + Send + Sync,
    {
        self.upgrade().and_then(|any| any.downcast::<S>().ok())
    }
}

impl std::fmt::Debug for SenderRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SenderRef")
            .field("alive", &self.is_alive())
            .finish()
    }
}
