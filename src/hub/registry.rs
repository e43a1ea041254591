//! # Subscription registry: the hub's one shared, mutable resource.
//!
//! Maps a message type to the ordered list of (proxy, subscription) entries
//! registered for it. Order within a list is subscribe order, which is also
//! delivery order.
//!
//! ## Rules
//! - Every read (snapshot) and write (insert/remove) happens inside a single
//!   mutex critical section scoped to the whole registry.
//! - The critical section covers list mutation, the lazy sweep and filter
//!   evaluation — never handler invocation, so handlers may re-enter the hub
//!   freely.
//! - Dead weak subscriptions are swept lazily whenever a type's list is
//!   visited; a type whose list drains empty is dropped from the map.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::subscription::Subscription;
use super::token::TokenId;
use crate::messages::Message;
use crate::proxies::DeliveryProxy;

/// One registered (proxy, subscription) pair.
#[derive(Clone)]
pub(crate) struct Entry {
    pub(crate) proxy: Arc<dyn DeliveryProxy>,
    pub(crate) subscription: Arc<dyn Subscription>,
}

/// Type-keyed subscription lists behind one lock.
pub(crate) struct Registry {
    inner: Mutex<HashMap<TypeId, Vec<Entry>>>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Appends an entry to the type's list, creating the list on first use.
    pub(crate) fn insert(&self, type_id: TypeId, entry: Entry) {
        let mut map = self.inner.lock();
        map.entry(type_id).or_default().push(entry);
    }

    /// Removes every entry of the type whose token matches.
    ///
    /// Returns the number of entries removed; zero when nothing matched
    /// (already removed, foreign token) — callers treat that as a no-op.
    pub(crate) fn remove(&self, type_id: TypeId, token: TokenId) -> usize {
        let mut map = self.inner.lock();
        let Some(list) = map.get_mut(&type_id) else {
            return 0;
        };
        let before = list.len();
        list.retain(|entry| entry.subscription.token_id() != token);
        let removed = before - list.len();
        if list.is_empty() {
            map.remove(&type_id);
        }
        removed
    }

    /// Snapshots the entries eligible for `message`, in subscribe order.
    ///
    /// Sweeps entries whose subscription is no longer live before
    /// snapshotting; the filter predicates run here, under the lock.
    pub(crate) fn snapshot_for(&self, type_id: TypeId, message: &dyn Message) -> Vec<Entry> {
        let mut map = self.inner.lock();
        let Some(list) = map.get_mut(&type_id) else {
            return Vec::new();
        };
        list.retain(|entry| entry.subscription.is_live());
        if list.is_empty() {
            map.remove(&type_id);
            return Vec::new();
        }
        list.iter()
            .filter(|entry| entry.subscription.should_deliver(message))
            .cloned()
            .collect()
    }

    /// Number of entries currently registered for the type.
    ///
    /// Counts dead weak entries that no sweep has visited yet.
    pub(crate) fn count(&self, type_id: TypeId) -> usize {
        self.inner
            .lock()
            .get(&type_id)
            .map_or(0, |list| list.len())
    }
}
