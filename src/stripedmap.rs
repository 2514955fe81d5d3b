use crate::config::{Config, RoutingConfig};
use crate::error::Error;
use crate::hash::ShardHasher;
use crate::iter::{IntoIter, Iter};
use crate::shard::Shard;
use crate::stats::{Diagnostics, ShardDiagnostics, ShardOps, Stats};
use crossbeam_utils::CachePadded;
use std::borrow::Borrow;
use std::hash::Hash;

/// Capabilities a key type needs: hashing, equality, and thread-safety.
///
/// Blanket-implemented, so it never needs to be implemented by hand.
pub trait MapKey: Hash + Eq + Send + Sync {}

impl<T> MapKey for T where T: Hash + Eq + Send + Sync {}

/// Concurrent hash map striped over a fixed number of independently locked shards.
///
/// Each key is routed to exactly one shard by hashing it, finalizing the hash,
/// and reducing it to a shard index. Single-key operations lock only that
/// shard. Whole-map operations (`len`, `for_each`, `remove_if`, ...) walk the
/// shards in index order, holding one shard lock at a time, so they are
/// *weakly consistent*: concurrent writers may change shard 3 after shard 1
/// was visited and before shard 5 is. There is no global lock and no
/// cross-shard snapshot.
///
/// Values are stored by value. Lookups return clones; in-place access is only
/// available through callbacks that run while the shard lock is held.
///
/// # Deadlocks
///
/// Callbacks passed to `inspect`, `update`, `compute_if_absent`, `merge`,
/// `update_if`, `for_each` and friends run *inside* the shard's critical
/// section. A callback must not call back into the same map (any key on the
/// same shard deadlocks), and a callback that blocks stalls every other
/// operation on its shard.
///
/// # Example
///
/// ```rust
/// use stripedmap::StripedMap;
///
/// let map = StripedMap::new();
/// map.insert("key1", 1);
///
/// map.update(&"key1", |v| *v += 1);
/// assert_eq!(map.get(&"key1"), Some(2));
/// ```
pub struct StripedMap<K, V> {
    shards: Box<[CachePadded<Shard<K, V>>]>,
    hasher: ShardHasher,
    routing: RoutingConfig,
}

impl<K, V> StripedMap<K, V>
where
    K: MapKey,
    V: Send + Sync,
{
    /// Create a new map with defaults (32 shards, 16 buckets each, ahash).
    pub fn new() -> Self {
        Self::build(Config::default())
    }

    /// Create a new map with custom config.
    pub fn with_config(config: Config) -> Result<Self, Error> {
        if config.shard_count == 0 {
            return Err(Error::InvalidShardCount);
        }
        Ok(Self::build(config))
    }

    fn build(config: Config) -> Self {
        tracing::debug!(
            shard_count = config.shard_count,
            capacity_per_shard = config.capacity_per_shard,
            hash_function = ?config.hash_function,
            routing = ?config.routing,
            "creating striped map"
        );

        let shards = (0..config.shard_count)
            .map(|_| CachePadded::new(Shard::with_capacity(config.capacity_per_shard)))
            .collect();

        Self {
            shards,
            hasher: config.hash_function.into(),
            routing: config.routing,
        }
    }

    /// Number of shards, fixed at construction.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Index of the shard `key` is routed to. Stable for the map's lifetime.
    #[inline]
    pub fn shard_index<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hasher.shard_hash(key);
        self.routing.route(hash, self.shards.len())
    }

    #[inline]
    fn shard_for<Q>(&self, key: &Q) -> &Shard<K, V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        &self.shards[self.shard_index(key)]
    }

    /// Get a copy of the value stored for `key`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use stripedmap::StripedMap;
    ///
    /// let map: StripedMap<String, i32> = StripedMap::new();
    /// map.insert("answer".to_string(), 42);
    /// assert_eq!(map.get("answer"), Some(42));
    /// assert_eq!(map.get("question"), None);
    /// ```
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.shard_for(key).get(key)
    }

    /// Get a copy of the stored value, or `default` if `key` is absent.
    ///
    /// The flag is `true` when the key was found. `default` is never stored.
    pub fn get_or_default<Q>(&self, key: &Q, default: V) -> (V, bool)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.shard_for(key).get_or_default(key, default)
    }

    /// Get a mutable reference without locking; `&mut self` rules out sharing.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = self.shard_index(key);
        self.shards[idx].table_mut().get_mut(key)
    }

    /// Check if a key exists without cloning the value.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.shard_for(key).contains_key(key)
    }

    /// Run `f` on the stored value in place, under the shard's read lock.
    ///
    /// Returns whether the key existed. See the type-level docs on deadlocks.
    pub fn inspect<Q, F>(&self, key: &Q, f: F) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        F: FnOnce(&V),
    {
        self.shard_for(key).inspect_map(key, f).is_some()
    }

    /// Project the stored value through `f` under the shard's read lock.
    ///
    /// `None` if the key is absent, `Some(f(value))` otherwise.
    ///
    /// # Example
    ///
    /// ```rust
    /// use stripedmap::StripedMap;
    ///
    /// let map = StripedMap::new();
    /// map.insert(1, vec![1, 2, 3]);
    /// assert_eq!(map.inspect_map(&1, |v| v.len()), Some(3));
    /// assert_eq!(map.inspect_map(&2, |v| v.len()), None);
    /// ```
    pub fn inspect_map<Q, F, R>(&self, key: &Q, f: F) -> Option<R>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        F: FnOnce(&V) -> R,
    {
        self.shard_for(key).inspect_map(key, f)
    }

    /// Like [`inspect_map`](Self::inspect_map) for callbacks that already
    /// return an `Option`: the callback's result is passed through as is, so
    /// the result is never `Option<Option<R>>`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use stripedmap::StripedMap;
    ///
    /// let map = StripedMap::new();
    /// map.insert("k", vec![10, 20]);
    /// assert_eq!(map.inspect_and_then(&"k", |v| v.get(1).copied()), Some(20));
    /// assert_eq!(map.inspect_and_then(&"k", |v| v.get(5).copied()), None);
    /// assert_eq!(map.inspect_and_then(&"x", |v| v.get(0).copied()), None);
    /// ```
    pub fn inspect_and_then<Q, F, R>(&self, key: &Q, f: F) -> Option<R>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        F: FnOnce(&V) -> Option<R>,
    {
        self.shard_for(key).inspect_map(key, f).flatten()
    }

    /// Mutate the stored value in place under the shard's write lock.
    ///
    /// Returns whether the key existed; nothing is inserted on absence.
    pub fn update<Q, F>(&self, key: &Q, f: F) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        F: FnOnce(&mut V),
    {
        self.shard_for(key).update(key, f)
    }

    /// Create the value only if `key` is absent, then pass the current value
    /// (pre-existing or new) to `access` before the lock is released.
    ///
    /// `create` runs at most once, and never when the key is present.
    ///
    /// # Example
    ///
    /// ```rust
    /// use stripedmap::StripedMap;
    ///
    /// let map: StripedMap<&str, Vec<u32>> = StripedMap::new();
    /// map.compute_if_absent("log", Vec::new, |v| v.push(1));
    /// let len = map.compute_if_absent("log", Vec::new, |v| { v.push(2); v.len() });
    /// assert_eq!(len, 2);
    /// ```
    pub fn compute_if_absent<C, A, R>(&self, key: K, create: C, access: A) -> R
    where
        C: FnOnce() -> V,
        A: FnOnce(&mut V) -> R,
    {
        let idx = self.shard_index(&key);
        self.shards[idx].compute_if_absent(key, create, access)
    }

    /// Return a copy of the stored value, inserting `create()` first if the
    /// key is absent. Concurrent callers for the same key run `create` once.
    pub fn get_or_insert_with<C>(&self, key: K, create: C) -> V
    where
        C: FnOnce() -> V,
        V: Clone,
    {
        self.compute_if_absent(key, create, |value| value.clone())
    }

    /// Insert `value` if `key` is absent; otherwise replace the stored value
    /// with `remap(&current, value)`, or remove the entry if that is `None`.
    ///
    /// If `remap` panics, the stored value is left unchanged and the panic
    /// propagates after the shard lock is released.
    ///
    /// # Example
    ///
    /// ```rust
    /// use stripedmap::StripedMap;
    ///
    /// let map = StripedMap::new();
    /// map.merge("hits", 1, |a, b| Some(a + b));
    /// map.merge("hits", 1, |a, b| Some(a + b));
    /// assert_eq!(map.get(&"hits"), Some(2));
    ///
    /// map.merge("hits", 0, |_, _| None);
    /// assert!(!map.contains_key(&"hits"));
    /// ```
    pub fn merge<F>(&self, key: K, value: V, remap: F)
    where
        F: FnOnce(&V, V) -> Option<V>,
    {
        let idx = self.shard_index(&key);
        self.shards[idx].merge(key, value, remap)
    }

    /// Remove a key-value pair, returning the value if it existed.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.shard_for(key).remove(key)
    }

    /// Insert or replace. Returns the old value if the key existed.
    ///
    /// # Example
    ///
    /// ```rust
    /// use stripedmap::StripedMap;
    ///
    /// let map = StripedMap::new();
    /// assert_eq!(map.insert("key", "value"), None);
    /// assert_eq!(map.insert("key", "new_value"), Some("value"));
    /// ```
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        let idx = self.shard_index(&key);
        self.shards[idx].insert(key, value)
    }

    /// Insert only if `key` is absent. Returns whether the insert happened;
    /// an existing value is never replaced.
    pub fn try_insert(&self, key: K, value: V) -> bool {
        let idx = self.shard_index(&key);
        self.shards[idx].try_insert(key, value)
    }

    /// Visit every entry, one shard at a time.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V),
    {
        for shard in self.shards.iter() {
            shard.for_each(&mut f);
        }
    }

    /// Visit entries until `f` returns `true`.
    ///
    /// Returns `true` if every entry was visited, `false` if `f` stopped the
    /// walk early.
    pub fn for_each_until<F>(&self, mut f: F) -> bool
    where
        F: FnMut(&K, &V) -> bool,
    {
        self.shards.iter().all(|shard| shard.for_each_until(&mut f))
    }

    /// Whether any entry satisfies `predicate`. Stops at the first match.
    pub fn contains_if<F>(&self, mut predicate: F) -> bool
    where
        F: FnMut(&K, &V) -> bool,
    {
        !self.for_each_until(|key, value| predicate(key, value))
    }

    /// Copy of the first value satisfying `predicate`.
    ///
    /// Shards are searched in index order; order within a shard is unspecified.
    pub fn find<F>(&self, mut predicate: F) -> Option<V>
    where
        F: FnMut(&K, &V) -> bool,
        V: Clone,
    {
        self.shards.iter().find_map(|shard| shard.find(&mut predicate))
    }

    /// Apply `predicate` to every entry with mutable access to the value and
    /// return how many times it returned `true`.
    ///
    /// Each shard is scanned under its write lock; the predicate decides
    /// whether and how to mutate, and nothing is rolled back.
    pub fn update_if<F>(&self, mut predicate: F) -> usize
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let updated: usize = self
            .shards
            .iter()
            .map(|shard| shard.update_if(&mut predicate))
            .sum();
        tracing::trace!(updated, "update_if finished");
        updated
    }

    /// Remove every entry for which `predicate` returns `true`, returning
    /// the number removed.
    ///
    /// # Example
    ///
    /// ```rust
    /// use stripedmap::StripedMap;
    ///
    /// let map = StripedMap::new();
    /// for i in 1..=5 {
    ///     map.insert(i, i);
    /// }
    /// assert_eq!(map.remove_if(|k, _| k % 2 == 0), 2);
    /// assert_eq!(map.len(), 3);
    /// ```
    pub fn remove_if<F>(&self, mut predicate: F) -> usize
    where
        F: FnMut(&K, &V) -> bool,
    {
        let removed: usize = self
            .shards
            .iter()
            .map(|shard| shard.remove_if(&mut predicate))
            .sum();
        tracing::trace!(removed, "remove_if finished");
        removed
    }

    /// Get the total number of entries across all shards.
    ///
    /// Best effort: shards are counted one lock at a time, so the result
    /// may not correspond to any single instant under concurrent writes.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.len()).sum()
    }

    /// Check if the map is empty. Weakly consistent like [`len`](Self::len).
    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|shard| shard.is_empty())
    }

    /// Remove all entries, shard by shard.
    ///
    /// Not atomic: concurrent inserts into an already cleared shard survive.
    pub fn clear(&self) {
        for shard in self.shards.iter() {
            shard.clear();
        }
        tracing::trace!(shard_count = self.shards.len(), "cleared striped map");
    }

    /// Per-shard share of a capacity hint, rounded up.
    fn per_shard(&self, additional: usize) -> usize {
        let n = self.shards.len();
        additional / n + usize::from(additional % n != 0)
    }

    /// Reserve room for at least `additional` more entries, split evenly
    /// (rounding up) across shards.
    ///
    /// # Panics
    ///
    /// Panics if the new capacity overflows; aborts on allocation failure.
    /// Use [`try_reserve`](Self::try_reserve) to handle both as errors.
    pub fn reserve(&self, additional: usize) {
        let per_shard = self.per_shard(additional);
        tracing::trace!(additional, per_shard, "reserving capacity");
        for shard in self.shards.iter() {
            shard.reserve(per_shard);
        }
    }

    /// Fallible [`reserve`](Self::reserve).
    ///
    /// Stops at the first shard that fails; shards before it keep their
    /// new capacity.
    pub fn try_reserve(&self, additional: usize) -> Result<(), Error> {
        let per_shard = self.per_shard(additional);
        for (index, shard) in self.shards.iter().enumerate() {
            if let Err(err) = shard.try_reserve(per_shard) {
                tracing::warn!(shard = index, per_shard, error = %err, "shard failed to reserve capacity");
                return Err(err);
            }
        }
        Ok(())
    }

    /// Iterate over cloned entries, one shard at a time.
    ///
    /// # Example
    ///
    /// ```rust
    /// use stripedmap::StripedMap;
    ///
    /// let map = StripedMap::new();
    /// map.insert("key1", "value1");
    /// map.insert("key2", "value2");
    ///
    /// let mut keys: Vec<_> = map.iter().map(|(k, _)| k).collect();
    /// keys.sort();
    /// assert_eq!(keys, ["key1", "key2"]);
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V>
    where
        K: Clone,
        V: Clone,
    {
        Iter::new(&self.shards)
    }

    /// Collect cloned entries into a vector (lock-by-lock, not atomic).
    pub fn snapshot(&self) -> Vec<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        let mut entries = Vec::new();
        for shard in self.shards.iter() {
            shard.copy_entries_into(&mut entries);
        }
        entries
    }

    /// Number of entries in each shard, in shard index order.
    pub fn shard_loads(&self) -> Vec<usize> {
        self.shards.iter().map(|shard| shard.len()).collect()
    }

    /// Get detailed statistics about the map and its shards.
    pub fn stats(&self) -> Stats {
        let shard_sizes = self.shard_loads();
        let operations: Vec<ShardOps> = self.shards.iter().map(|s| s.stats()).collect();
        let size: usize = shard_sizes.iter().sum();

        Stats {
            size,
            shard_sizes,
            operations,
        }
    }

    /// Load-balance snapshot: per-shard entries and counters plus the
    /// max/average load ratio.
    pub fn diagnostics(&self) -> Diagnostics {
        let shards = self
            .shards
            .iter()
            .map(|shard| ShardDiagnostics {
                entries: shard.len(),
                ops: shard.stats(),
            })
            .collect();
        Diagnostics::from_shards(shards)
    }
}

impl<K, V> Default for StripedMap<K, V>
where
    K: MapKey,
    V: Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> std::fmt::Debug for StripedMap<K, V>
where
    K: MapKey,
    V: Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripedMap")
            .field("shard_count", &self.shard_count())
            .field("len", &self.len())
            .field("hasher", &self.hasher)
            .field("routing", &self.routing)
            .finish()
    }
}

impl<K, V> FromIterator<(K, V)> for StripedMap<K, V>
where
    K: MapKey,
    V: Send + Sync,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K, V> Extend<(K, V)> for StripedMap<K, V>
where
    K: MapKey,
    V: Send + Sync,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            let idx = self.shard_index(&key);
            self.shards[idx].table_mut().insert(key, value);
        }
    }
}

impl<K, V> IntoIterator for StripedMap<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        let tables = self
            .shards
            .into_vec()
            .into_iter()
            .map(|shard| CachePadded::into_inner(shard).into_inner())
            .collect();
        IntoIter::new(tables)
    }
}

impl<'a, K, V> IntoIterator for &'a StripedMap<K, V>
where
    K: MapKey + Clone,
    V: Send + Sync + Clone,
{
    type Item = (K, V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
