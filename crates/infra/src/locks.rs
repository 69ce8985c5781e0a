//! Per-entity mutual exclusion.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

/// One mutex per entity id, created on first use and dropped again once no
/// caller holds or waits on it, so the map only holds ids in use.
///
/// Guards protect no data of their own, so a poisoned lock (a panic while
/// held) is simply taken over. When two entities are locked together the
/// order is always shipment before order.
#[derive(Debug)]
pub struct EntityLocks<K> {
    inner: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K> Default for EntityLocks<K> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }
}

impl<K> EntityLocks<K>
where
    K: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, key: &K) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        map.entry(key.clone()).or_default().clone()
    }

    /// Forget `key` if the map and `handle` are the only owners left.
    ///
    /// Handles are only cloned under the map lock, so nobody can pick this
    /// mutex up between the count check and the removal.
    fn release(&self, key: &K, handle: &Arc<Mutex<()>>) {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let current = map.get(key).is_some_and(|h| Arc::ptr_eq(h, handle));
        if current && Arc::strong_count(handle) == 2 {
            map.remove(key);
        }
    }

    /// Run `f` while holding the lock for `key`.
    pub fn with<T>(&self, key: &K, f: impl FnOnce() -> T) -> T {
        let handle = self.handle(key);
        let out = {
            let _guard = handle.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };
        self.release(key, &handle);
        out
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
