//! Hub core: registry, subscriptions, tokens and the publish pipeline.
//!
//! The only entry point from this module is [`Hub`] plus the types its API
//! hands out.
//!
//! Internal modules:
//! - [`hub`]: subscribe/unsubscribe/publish/publish_async, builder, fan-out;
//! - [`registry`]: type-keyed subscription lists behind one lock;
//! - [`subscription`]: handler + filter bound to a liveness policy;
//! - [`token`]: opaque one-shot release handles;
//! - [`options`]: per-subscription configuration.

mod hub;
mod options;
mod registry;
mod subscription;
mod token;

pub use hub::{Completion, DeliveryFailure, Hub, HubBuilder};
pub use options::SubscribeOptions;
pub use subscription::{FilterRef, HandlerRef, ReferenceMode, Subscription};
pub use token::{ScopedToken, SubscriptionToken, TokenId};
