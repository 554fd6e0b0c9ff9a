//! Keyed state store with synchronous change notification.
//!
//! `set` overwrites a value and then calls every subscriber of that key, in
//! registration order, before returning. The internal lock is released before
//! any callback runs, so a subscriber may write other keys from inside its
//! notification. Writing the key currently being notified recurses and is the
//! subscriber's responsibility.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Subscriber callback: `(new, previous)`.
type Callback<V> = Arc<dyn Fn(&V, Option<&V>) + Send + Sync>;

struct Inner<K, V> {
    values: HashMap<K, V>,
    listeners: HashMap<K, Vec<(u64, Callback<V>)>>,
    next_id: u64,
}

/// Shared handle to a store; clones observe the same values.
pub struct StateStore<K, V> {
    inner: Arc<Mutex<Inner<K, V>>>,
}

impl<K, V> Clone for StateStore<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> Default for StateStore<K, V> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                values: HashMap::new(),
                listeners: HashMap::new(),
                next_id: 0,
            })),
        }
    }
}

fn lock<K, V>(inner: &Mutex<Inner<K, V>>) -> MutexGuard<'_, Inner<K, V>> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<K, V> StateStore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value for `key`, if any.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        lock(&self.inner).values.get(key).cloned()
    }

    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        lock(&self.inner).values.contains_key(key)
    }

    /// Overwrite `key` and notify its subscribers with the new and previous value.
    pub fn set(&self, key: K, value: V) {
        let (previous, listeners) = {
            let mut inner = lock(&self.inner);
            let previous = inner.values.insert(key.clone(), value.clone());
            let listeners: Vec<Callback<V>> = inner
                .listeners
                .get(&key)
                .map(|ls| ls.iter().map(|(_, cb)| Arc::clone(cb)).collect())
                .unwrap_or_default();
            (previous, listeners)
        };

        for callback in listeners {
            callback(&value, previous.as_ref());
        }
    }

    /// Register `callback` for changes to `key`.
    pub fn on<F>(&self, key: K, callback: F) -> Subscription<K, V>
    where
        F: Fn(&V, Option<&V>) + Send + Sync + 'static,
    {
        let mut inner = lock(&self.inner);
        let id = inner.next_id;
        inner.next_id = inner.next_id.wrapping_add(1);
        inner
            .listeners
            .entry(key.clone())
            .or_default()
            .push((id, Arc::new(callback)));

        Subscription {
            store: Arc::downgrade(&self.inner),
            key,
            id,
        }
    }

    /// Keys that currently hold a value.
    #[must_use]
    pub fn keys(&self) -> Vec<K> {
        lock(&self.inner).values.keys().cloned().collect()
    }

    #[must_use]
    pub fn subscriber_count(&self, key: &K) -> usize {
        lock(&self.inner).listeners.get(key).map_or(0, Vec::len)
    }
}

/// Deregistration handle returned by [`StateStore::on`].
///
/// Dropping the handle keeps the subscription alive; call
/// [`Subscription::unsubscribe`] to stop notifications.
pub struct Subscription<K, V> {
    store: Weak<Mutex<Inner<K, V>>>,
    key: K,
    id: u64,
}

impl<K: Eq + Hash, V> Subscription<K, V> {
    pub fn unsubscribe(self) {
        let Some(inner) = self.store.upgrade() else {
            return;
        };
        let mut inner = lock(&inner);
        if let Some(listeners) = inner.listeners.get_mut(&self.key) {
            listeners.retain(|(id, _)| *id != self.id);
            if listeners.is_empty() {
                inner.listeners.remove(&self.key);
            }
        }
    }
}
