//! Execution-context dispatching for marshalled deliveries.
//!
//! This module groups the dispatcher **contract** and the built-in
//! implementation:
//!
//! - [`Dispatch`], [`Job`] — the interface a
//!   [`MarshalProxy`](crate::MarshalProxy) marshals through;
//! - [`ContextDispatcher`] — a dedicated Tokio worker task that runs jobs
//!   in FIFO order with per-job panic isolation.
//!
//! The hub never touches this module directly; only proxy implementations do.

mod context;
mod dispatch;

pub use context::ContextDispatcher;
pub use dispatch::{Dispatch, Job};
