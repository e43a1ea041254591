//! # Subscription tokens: opaque handles with one-shot release.
//!
//! [`SubscriptionToken`] is the handle returned by every subscribe call. It
//! embeds everything needed to remove its subscription later — the message
//! type identity, the token id and a weak back-reference to the hub — so
//! release never needs a type parameter and holding a token never keeps the
//! hub alive.
//!
//! ## Rules
//! - `release()` is idempotent: the second and later calls are silent no-ops.
//! - Dropping a bare token does **not** unsubscribe; wrap it in a
//!   [`ScopedToken`] when release must happen on a teardown path.
//! - After release the token identifies no live subscription; it cannot be
//!   resurrected.

use std::any::TypeId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Weak;

use super::hub::HubShared;

/// Global sequence for token identities.
static NEXT_TOKEN_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one subscription within a hub.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TokenId(pub(crate) u64);

impl TokenId {
    pub(crate) fn next() -> Self {
        TokenId(NEXT_TOKEN_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Opaque handle identifying one subscription.
///
/// Returned by [`Hub::subscribe`](crate::Hub::subscribe) and
/// [`Hub::subscribe_with`](crate::Hub::subscribe_with). Release is the only
/// sanctioned way to unsubscribe besides
/// [`Hub::unsubscribe`](crate::Hub::unsubscribe).
pub struct SubscriptionToken {
    pub(crate) hub: Weak<HubShared>,
    pub(crate) type_id: TypeId,
    pub(crate) type_name: &'static str,
    pub(crate) id: TokenId,
}

impl SubscriptionToken {
    /// Returns the token identity.
    pub fn id(&self) -> TokenId {
        self.id
    }

    /// Returns the name of the message type this token was issued for.
    pub fn message_type(&self) -> &'static str {
        self.type_name
    }

    /// Removes the subscription from the hub it came from.
    ///
    /// Idempotent: releasing twice, or releasing after the subscription was
    /// already removed, is a silent no-op. When the hub itself is gone the
    /// call does nothing.
    pub fn release(&self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.remove_subscription(self.type_id, self.type_name, self.id);
        }
    }

    /// Converts the token into an RAII guard that releases on drop.
    pub fn into_scoped(self) -> ScopedToken {
        ScopedToken { token: Some(self) }
    }
}

impl std::fmt::Debug for SubscriptionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionToken")
            .field("message_type", &self.type_name)
            .field("id", &self.id.0)
            .finish()
    }
}

/// RAII guard around a [`SubscriptionToken`].
///
/// Releases the subscription when dropped, making unsubscription part of
/// scope teardown. Use [`forget`](ScopedToken::forget) to defuse the guard
/// and keep the subscription alive.
#[must_use = "dropping a ScopedToken releases the subscription immediately"]
#[derive(Debug)]
pub struct ScopedToken {
    token: Option<SubscriptionToken>,
}

impl ScopedToken {
    /// Returns the guarded token.
    pub fn token(&self) -> &SubscriptionToken {
        self.token.as_ref().expect("token is present until drop")
    }

    /// Defuses the guard and hands the token back without releasing it.
    pub fn forget(mut self) -> SubscriptionToken {
        self.token.take().expect("token is present until drop")
    }
}

impl Drop for ScopedToken {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            token.release();
        }
    }
}
