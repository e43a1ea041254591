//! # Composition-root registry for a process-wide hub.
//!
//! Most applications should pass a [`Hub`] (it is a cheap clone) to every
//! component that publishes or subscribes. When a process-wide instance is
//! unavoidable, this module confines the singleton to the composition root:
//! install exactly once at startup, [`reset`] only from tests.
//!
//! Enabled via the `locator` feature.
//!
//! ## Example
//! ```
//! use typebus::{locator, Hub, Message};
//!
//! struct Boot;
//! impl Message for Boot {}
//!
//! locator::reset(); // test isolation
//! locator::install(Hub::new()).unwrap();
//! let _token = locator::subscribe(|_: &Boot| println!("booted"));
//! locator::publish(Boot);
//! # locator::reset();
//! ```

use parking_lot::RwLock;
use thiserror::Error;
use tracing::debug;

use crate::hub::{Hub, SubscribeOptions, SubscriptionToken};
use crate::messages::Message;

static GLOBAL_HUB: RwLock<Option<Hub>> = RwLock::new(None);

/// Errors raised by the composition-root registry.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum LocatorError {
    /// [`install`] was called while a global hub was already present.
    #[error("a global hub is already installed")]
    AlreadyInstalled,
}

/// Installs the process-wide hub. Explicit initialization: fails when a hub
/// is already installed instead of silently replacing it.
pub fn install(hub: Hub) -> Result<(), LocatorError> {
    let mut slot = GLOBAL_HUB.write();
    if slot.is_some() {
        return Err(LocatorError::AlreadyInstalled);
    }
    *slot = Some(hub);
    debug!("global hub installed");
    Ok(())
}

/// Returns a clone of the global hub, if one is installed.
pub fn try_global() -> Option<Hub> {
    GLOBAL_HUB.read().clone()
}

/// Returns a clone of the global hub.
///
/// # Panics
/// Panics when no hub has been installed; call [`install`] at the
/// composition root first.
pub fn global() -> Hub {
    try_global().expect("no global hub installed; call locator::install at the composition root")
}

/// Clears the global hub. Exposed solely for test isolation.
pub fn reset() {
    GLOBAL_HUB.write().take();
}

/// Publishes through the global hub. See [`Hub::publish`].
pub fn publish<M: Message>(message: M) {
    global().publish(message);
}

/// Subscribes on the global hub. See [`Hub::subscribe`].
pub fn subscribe<M, F>(handler: F) -> SubscriptionToken
where
    M: Message,
    F: Fn(&M) + Send + Sync + 'static,
{
    global().subscribe(handler)
}

/// Subscribes on the global hub with explicit options. See
/// [`Hub::subscribe_with`].
pub fn subscribe_with<M: Message>(options: SubscribeOptions<M>) -> SubscriptionToken {
    global().subscribe_with(options)
}
