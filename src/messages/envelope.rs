//! # Generic payload carrier.
//!
//! [`Envelope`] wraps an arbitrary payload into a publishable message, for
//! call sites that do not warrant a dedicated message struct. The envelope
//! optionally records its originator as a [`SenderRef`].

use std::any::Any;
use std::sync::Arc;

use super::message::{Message, SenderRef};

/// A ready-made [`Message`] carrying an arbitrary payload.
///
/// Routing is by the full `Envelope<T>` type, so `Envelope<i32>` and
/// `Envelope<String>` form independent channels.
///
/// # Example
/// ```
/// use typebus::{Envelope, Hub};
///
/// let hub = Hub::new();
/// let _token = hub.subscribe(|msg: &Envelope<i32>| {
///     println!("got {}", msg.content());
/// });
/// hub.publish(Envelope::new(42));
/// ```
#[derive(Debug)]
pub struct Envelope<T>
where
    T: Send + Sync + 'static,
{
    content: T,
    sender: Option<SenderRef>,
}

impl<T> Envelope<T>
where
    T: Send + Sync + 'static,
{
    /// Wraps a payload with no originator attached.
    pub fn new(content: T) -> Self {
        Self {
            content,
            sender: None,
        }
    }

    /// Wraps a payload and records `sender` as its weakly-held originator.
    pub fn from_sender<S>(sender: &Arc<S>, content: T) -> Self
    where
        S: Any + Send + Sync,
    {
        Self {
            content,
            sender: Some(SenderRef::of(sender)),
        }
    }

    /// Returns the wrapped payload.
    pub fn content(&self) -> &T {
        &self.content
    }
}

impl<T> Message for Envelope<T>
where
    T: Send + Sync + 'static,
{
    fn sender(&self) -> Option<&SenderRef> {
        self.sender.as_ref()
    }
}
