//! Single-writer-per-key lock registry.
//!
//! [`KeyedLocks`] hands out one [`tokio::sync::Mutex`] per key. Writers for
//! the same key queue behind each other while writers for different keys
//! proceed concurrently. The outer map is only write-locked the first time a
//! key is seen; idle entries are swept once the map grows large, or on
//! [`KeyedLocks::prune`].

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

/// Registry of per-key mutexes.
///
/// # Concurrency
///
/// - Holders of different keys never block each other.
/// - Holders of the same key are serialized in FIFO order (tokio's mutex is
///   fair).
#[derive(Debug)]
pub struct KeyedLocks<K> {
    locks: RwLock<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K> KeyedLocks<K>
where
    K: Eq + Hash + Copy,
{
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            locks: RwLock::new(HashMap::new()),
        }
    }

    /// Waits for exclusive access to `key`. Access is released when the
    /// returned guard is dropped.
    pub async fn lock(&self, key: K) -> OwnedMutexGuard<()> {
        let existing = self.locks.read().await.get(&key).cloned();
        let mutex = match existing {
            Some(mutex) => mutex,
            None => {
                let mut map = self.locks.write().await;
                if map.len() >= PRUNE_THRESHOLD && !map.contains_key(&key) {
                    retain_busy(&mut map);
                }
                Arc::clone(map.entry(key).or_default())
            }
        };
        mutex.lock_owned().await
    }

    /// Drops the mutexes nobody holds or waits on. Returns how many were
    /// removed.
    pub async fn prune(&self) -> usize {
        let mut map = self.locks.write().await;
        let before = map.len();
        retain_busy(&mut map);
        before.saturating_sub(map.len())
    }

    /// Returns the number of keys currently tracked.
    pub async fn len(&self) -> usize {
        self.locks.read().await.len()
    }

    /// Returns `true` if no key is tracked.
    pub async fn is_empty(&self) -> bool {
        self.locks.read().await.is_empty()
    }
}

/// Map size at which inserting a new key first sweeps idle entries.
const PRUNE_THRESHOLD: usize = 4096;

/// Keeps only mutexes with a holder or a waiter. Both keep a clone of the
/// `Arc`, and new clones are only taken under the map lock held here.
fn retain_busy<K>(map: &mut HashMap<K, Arc<Mutex<()>>>) {
    map.retain(|_, mutex| Arc::strong_count(mutex) > 1);
}

impl<K> Default for KeyedLocks<K>
where
    K: Eq + Hash + Copy,
{
    fn default() -> Self {
        Self::new()
    }
}
