//! Error types used by the hub and the execution-context dispatcher.
//!
//! This module defines two main error enums:
//!
//! - [`PublishError`] — failures of a scheduled (asynchronous) publish pass.
//! - [`DispatchError`] — failures of a job handed to a [`Dispatch`](crate::Dispatch) context.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.
//!
//! Contract violations of the classic bus design (absent callback, filter,
//! proxy, token or message) have no runtime representation here: the subscribe
//! and publish APIs make them unrepresentable, so the only runtime failures
//! left are panics escaping user code and dropped scheduling.

use std::any::Any;

use thiserror::Error;

/// # Errors produced by a scheduled publish pass.
///
/// A synchronous [`publish`](crate::Hub::publish) contains per-subscriber
/// failures itself and never returns one of these. They surface only through
/// the [`Completion`](crate::Completion) future handed out by
/// [`publish_async`](crate::Hub::publish_async).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum PublishError {
    /// The scheduled publish pass itself panicked.
    ///
    /// Per-subscriber panics are contained inside the fan-out loop and do not
    /// produce this error; a panic here indicates the pass failed before or
    /// between deliveries (e.g. a corrupted registry entry).
    #[error("scheduled publish panicked: {reason}")]
    Panicked {
        /// Extracted panic payload, best effort.
        reason: String,
    },

    /// The runtime dropped the scheduled publish before it ran.
    #[error("scheduled publish was dropped before running")]
    Aborted,
}

impl PublishError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use typebus::PublishError;
    ///
    /// let err = PublishError::Aborted;
    /// assert_eq!(err.as_label(), "publish_aborted");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            PublishError::Panicked { .. } => "publish_panicked",
            PublishError::Aborted => "publish_aborted",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            PublishError::Panicked { reason } => format!("panicked: {reason}"),
            PublishError::Aborted => "dropped before running".to_string(),
        }
    }
}

/// # Errors produced by an execution-context dispatcher.
///
/// Returned by [`Dispatch::run`](crate::Dispatch::run) and
/// [`Dispatch::run_after`](crate::Dispatch::run_after) when a marshalled job
/// could not complete.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The job panicked while running on the target context.
    #[error("dispatched job panicked: {reason}")]
    Panicked {
        /// Extracted panic payload, best effort.
        reason: String,
    },

    /// The dispatcher was shut down before the job could run.
    #[error("dispatch context closed")]
    Closed,
}

impl DispatchError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use typebus::DispatchError;
    ///
    /// let err = DispatchError::Closed;
    /// assert_eq!(err.as_label(), "dispatch_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            DispatchError::Panicked { .. } => "dispatch_panicked",
            DispatchError::Closed => "dispatch_closed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            DispatchError::Panicked { reason } => format!("panicked: {reason}"),
            DispatchError::Closed => "context closed".to_string(),
        }
    }
}

/// Extracts a printable reason from a caught panic payload.
///
/// Panics carry `&'static str` or `String` payloads in practice; anything
/// else degrades to a fixed marker.
pub(crate) fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
