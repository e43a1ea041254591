//! # typebus
//!
//! **Typebus** is a lightweight, type-routed in-process publish/subscribe hub for Rust.
//!
//! Components register interest in a message **type**; publishers deliver
//! instances of that type to every currently-eligible subscriber. Neither
//! side holds a reference to the other, and subscribers may disappear without
//! unsubscribing (weak mode). The crate is designed as a building block for
//! decoupled application runtimes and UI shells.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//!  │ Publisher A │    │ Publisher B │    │ Publisher C │
//!  └──────┬──────┘    └──────┬──────┘    └──────┬──────┘
//!         │ publish(M)       │ publish(N)       │ publish_async(M)
//!         ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Hub                                                              │
//! │  - Registry: TypeId → [(proxy, subscription), ...]  (one lock)    │
//! │  - snapshot eligible entries under the lock, fan out outside it   │
//! │  - per-entry panic containment (counter + hook + warn!)           │
//! └──────┬──────────────────────┬──────────────────────┬──────────────┘
//!        │ subscribe order      │                      │
//!        ▼                      ▼                      ▼
//!  ┌───────────────┐    ┌───────────────┐    ┌──────────────────────┐
//!  │  DirectProxy  │    │  DirectProxy  │    │     MarshalProxy     │
//!  │ (same thread) │    │ (same thread) │    │ (Dispatch context)   │
//!  └──────┬────────┘    └──────┬────────┘    └──────────┬───────────┘
//!         ▼                    ▼                        ▼
//!     handler(&M)          handler(&M)        [queue] ─► worker ─► handler(&M)
//! ```
//!
//! ### Delivery pipeline
//! ```text
//! publish(message)
//!   ├─► lock registry
//!   │     ├─ sweep entries whose weak targets died
//!   │     └─ snapshot entries where:
//!   │          dynamic type matches
//!   │          AND (weak mode) handler + filter still alive
//!   │          AND filter(message) == true
//!   ├─► unlock  (handlers may re-enter subscribe/unsubscribe/publish)
//!   └─► for each snapshotted entry, in subscribe order:
//!         proxy.deliver(message, subscription)
//!           └─ panic → caught at the entry boundary, recorded, fan-out continues
//! ```
//!
//! ## Features
//! | Area               | Description                                                      | Key types / traits                          |
//! |--------------------|------------------------------------------------------------------|---------------------------------------------|
//! | **Messages**       | Route by concrete type; optional weak originator handle.         | [`Message`], [`SenderRef`], [`Envelope`]    |
//! | **Subscriptions**  | Strong/weak holding, per-subscription filter, opaque tokens.     | [`SubscribeOptions`], [`SubscriptionToken`] |
//! | **Delivery**       | Pluggable proxies; same-thread default, context marshalling.     | [`DeliveryProxy`], [`DirectProxy`], [`MarshalProxy`] |
//! | **Dispatching**    | Execution contexts with FIFO jobs and delayed scheduling.        | [`Dispatch`], [`ContextDispatcher`]         |
//! | **Async publish**  | Fire-and-forget publishing with an awaitable completion.         | [`Completion`], [`PublishError`]            |
//! | **Diagnostics**    | Contained-failure hook, counters, `tracing` events.              | [`HubBuilder`], [`DeliveryFailure`]         |
//!
//! ## Optional features
//! - `locator`: process-wide hub registry for composition roots _(prefer
//!   passing a [`Hub`] explicitly)_.
//!
//! ## Example
//! ```rust
//! use typebus::{Hub, Message, SubscribeOptions};
//!
//! struct PriceChanged {
//!     symbol: &'static str,
//!     price: f64,
//! }
//! impl Message for PriceChanged {}
//!
//! let hub = Hub::new();
//!
//! // Plain subscription: strong references, every instance delivered.
//! let log = hub.subscribe(|m: &PriceChanged| {
//!     println!("{} is now {}", m.symbol, m.price);
//! });
//!
//! // Filtered subscription: only large moves.
//! let alerts = hub.subscribe_with(
//!     SubscribeOptions::new(|m: &PriceChanged| println!("ALERT {}", m.symbol))
//!         .with_filter(|m| m.price > 100.0),
//! );
//!
//! hub.publish(PriceChanged { symbol: "XYZ", price: 99.0 });  // log only
//! hub.publish(PriceChanged { symbol: "XYZ", price: 101.0 }); // log + alert
//!
//! alerts.release();
//! log.release();
//! ```

mod dispatch;
mod error;
mod hub;
mod messages;
mod proxies;

// ---- Public re-exports ----

pub use dispatch::{ContextDispatcher, Dispatch, Job};
pub use error::{DispatchError, PublishError};
pub use hub::{
    Completion, DeliveryFailure, FilterRef, HandlerRef, Hub, HubBuilder, ReferenceMode,
    ScopedToken, SubscribeOptions, Subscription, SubscriptionToken, TokenId,
};
pub use messages::{Envelope, Message, SenderRef};
pub use proxies::{DeliveryProxy, DirectProxy, MarshalProxy};

// Optional: process-wide hub registry for composition roots.
// Enable with: `--features locator`
#[cfg(feature = "locator")]
pub mod locator;
