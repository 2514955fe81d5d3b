use crate::error::Error;
use crate::stats::{ShardOps, ShardStats};
use hashbrown::hash_map::Entry;
use hashbrown::HashMap;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::borrow::Borrow;
use std::hash::Hash;

/// A single shard containing a HashMap protected by a read-write lock.
///
/// Every method takes the lock for exactly its own duration. Guards are
/// scoped, so a panicking callback releases the lock while unwinding.
pub(crate) struct Shard<K, V> {
    table: RwLock<HashMap<K, V>>,
    stats: ShardStats,
}

impl<K, V> Shard<K, V> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            table: RwLock::new(HashMap::with_capacity(capacity)),
            stats: ShardStats::new(),
        }
    }

    #[inline]
    fn read(&self) -> RwLockReadGuard<'_, HashMap<K, V>> {
        #[cfg(feature = "lock-timing")]
        let start = std::time::Instant::now();
        let guard = self.table.read();
        self.stats.record_lock_acquisition();
        #[cfg(feature = "lock-timing")]
        self.stats.record_lock_wait(start.elapsed().as_nanos() as u64);
        guard
    }

    #[inline]
    fn write(&self) -> RwLockWriteGuard<'_, HashMap<K, V>> {
        #[cfg(feature = "lock-timing")]
        let start = std::time::Instant::now();
        let guard = self.table.write();
        self.stats.record_lock_acquisition();
        #[cfg(feature = "lock-timing")]
        self.stats.record_lock_wait(start.elapsed().as_nanos() as u64);
        guard
    }

    /// Direct access to the table; `&mut self` proves no other thread holds the lock.
    pub fn table_mut(&mut self) -> &mut HashMap<K, V> {
        self.table.get_mut()
    }

    pub fn into_inner(self) -> HashMap<K, V> {
        self.table.into_inner()
    }

    /// Get the number of entries in this shard.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check if this shard is empty.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    /// Get a snapshot of statistics for this shard.
    pub fn stats(&self) -> ShardOps {
        self.stats.snapshot()
    }

    /// Visit every entry under one read lock.
    pub fn for_each<F>(&self, f: &mut F)
    where
        F: FnMut(&K, &V),
    {
        let table = self.read();
        for (key, value) in table.iter() {
            f(key, value);
        }
    }

    /// Visit entries until `f` returns `true`. Returns `true` if the whole
    /// shard was visited without `f` asking to stop.
    pub fn for_each_until<F>(&self, f: &mut F) -> bool
    where
        F: FnMut(&K, &V) -> bool,
    {
        let table = self.read();
        for (key, value) in table.iter() {
            if f(key, value) {
                return false;
            }
        }
        true
    }

    /// Append clones of every entry to `buf`.
    pub fn copy_entries_into(&self, buf: &mut Vec<(K, V)>)
    where
        K: Clone,
        V: Clone,
    {
        let table = self.read();
        buf.reserve(table.len());
        buf.extend(table.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
}

impl<K, V> Shard<K, V>
where
    K: Hash + Eq,
{
    /// Get a copy of the value stored for `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        let table = self.read();
        let result = table.get(key).cloned();
        if result.is_some() {
            self.stats.record_read();
        }
        result
    }

    /// Stored value and `true`, or `default` and `false`. Never stores `default`.
    pub fn get_or_default<Q>(&self, key: &Q, default: V) -> (V, bool)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        match self.get(key) {
            Some(value) => (value, true),
            None => (default, false),
        }
    }

    /// Check if a key exists without cloning the value.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.read().contains_key(key)
    }

    pub fn inspect_map<Q, F, R>(&self, key: &Q, f: F) -> Option<R>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        F: FnOnce(&V) -> R,
    {
        let table = self.read();
        let value = table.get(key)?;
        self.stats.record_read();
        Some(f(value))
    }

    pub fn update<Q, F>(&self, key: &Q, f: F) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        F: FnOnce(&mut V),
    {
        let mut table = self.write();
        match table.get_mut(key) {
            Some(value) => {
                f(value);
                self.stats.record_writes(1);
                true
            }
            None => false,
        }
    }

    /// Run `predicate` on every entry under one write lock, counting `true` results.
    pub fn update_if<F>(&self, predicate: &mut F) -> usize
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let mut table = self.write();
        let mut updated = 0;
        for (key, value) in table.iter_mut() {
            if predicate(key, value) {
                updated += 1;
            }
        }
        self.stats.record_writes(updated);
        updated
    }

    /// Create the value with `create` only if `key` is vacant, then hand
    /// the current value to `access`, all under one write lock.
    pub fn compute_if_absent<C, A, R>(&self, key: K, create: C, access: A) -> R
    where
        C: FnOnce() -> V,
        A: FnOnce(&mut V) -> R,
    {
        let mut table = self.write();
        let value = match table.entry(key) {
            Entry::Occupied(entry) => {
                self.stats.record_read();
                entry.into_mut()
            }
            Entry::Vacant(entry) => {
                self.stats.record_writes(1);
                entry.insert(create())
            }
        };
        access(value)
    }

    /// The stored value stays in the table until `remap` returns, so a
    /// panicking `remap` leaves the entry as it was.
    pub fn merge<F>(&self, key: K, value: V, remap: F)
    where
        F: FnOnce(&V, V) -> Option<V>,
    {
        let mut table = self.write();
        match table.entry(key) {
            Entry::Occupied(mut entry) => match remap(entry.get(), value) {
                Some(next) => {
                    entry.insert(next);
                    self.stats.record_writes(1);
                }
                None => {
                    entry.remove();
                    self.stats.record_removes(1);
                }
            },
            Entry::Vacant(entry) => {
                entry.insert(value);
                self.stats.record_writes(1);
            }
        }
    }

    /// Remove a key-value pair, returning the value if it existed.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut table = self.write();
        let result = table.remove(key);
        if result.is_some() {
            self.stats.record_removes(1);
        }
        result
    }

    pub fn remove_if<F>(&self, predicate: &mut F) -> usize
    where
        F: FnMut(&K, &V) -> bool,
    {
        let mut table = self.write();
        let before = table.len();
        table.retain(|key, value| !predicate(key, &*value));
        let removed = before - table.len();
        self.stats.record_removes(removed);
        removed
    }

    /// Insert a key-value pair, returning the previous value if any.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        let mut table = self.write();
        self.stats.record_writes(1);
        table.insert(key, value)
    }

    /// Insert only if `key` is vacant.
    pub fn try_insert(&self, key: K, value: V) -> bool {
        let mut table = self.write();
        match table.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(value);
                self.stats.record_writes(1);
                true
            }
        }
    }

    /// First value (in table order) for which `predicate` holds.
    pub fn find<F>(&self, predicate: &mut F) -> Option<V>
    where
        F: FnMut(&K, &V) -> bool,
        V: Clone,
    {
        let table = self.read();
        table
            .iter()
            .find(|&(key, value)| predicate(key, value))
            .map(|(_, value)| value.clone())
    }

    pub fn reserve(&self, additional: usize) {
        self.write().reserve(additional);
    }

    pub fn try_reserve(&self, additional: usize) -> Result<(), Error> {
        self.write().try_reserve(additional).map_err(Error::from)
    }
}
