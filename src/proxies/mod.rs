//! Delivery proxies: the pluggable indirection between hub and handler.
//!
//! The hub never invokes a handler directly; it hands each eligible
//! (message, subscription) pair to the subscription's [`DeliveryProxy`].
//! The proxy decides how and where the handler actually runs:
//!
//! - [`DirectProxy`] — default; invokes the handler synchronously on the
//!   publishing thread.
//! - [`MarshalProxy`] — moves the invocation onto an execution context via
//!   [`Dispatch`](crate::Dispatch), synchronously when already there.
//!
//! The one-method trait is the hub's entire dependency: it knows nothing
//! about threads, queues or runtimes.

mod marshal;
mod proxy;

pub use marshal::MarshalProxy;
pub use proxy::{DeliveryProxy, DirectProxy};
