use crate::shard::Shard;
use crossbeam_utils::CachePadded;

/// Lock-by-lock iterator over cloned entries.
///
/// Entries are copied out of one shard at a time while holding that shard's
/// read lock, then yielded without any lock held. Writers may run between
/// shards, so the sequence is weakly consistent: an entry inserted into an
/// already-visited shard is missed, and one moved between shards can be seen
/// twice.
pub struct Iter<'a, K, V> {
    shards: &'a [CachePadded<Shard<K, V>>],
    next_shard: usize,
    buffer: std::vec::IntoIter<(K, V)>,
}

impl<'a, K, V> Iter<'a, K, V>
where
    K: Clone,
    V: Clone,
{
    pub(crate) fn new(shards: &'a [CachePadded<Shard<K, V>>]) -> Self {
        Self {
            shards,
            next_shard: 0,
            buffer: Vec::new().into_iter(),
        }
    }

    /// Load the next non-empty shard into the buffer.
    fn fill_buffer(&mut self) -> bool {
        let mut entries = Vec::new();
        while self.next_shard < self.shards.len() {
            self.shards[self.next_shard].copy_entries_into(&mut entries);
            self.next_shard += 1;
            if !entries.is_empty() {
                self.buffer = entries.into_iter();
                return true;
            }
        }
        false
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V>
where
    K: Clone,
    V: Clone,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.buffer.next() {
                return Some(item);
            }
            if !self.fill_buffer() {
                return None;
            }
        }
    }
}

/// Owning iterator returned by `StripedMap::into_iter`.
///
/// The map is consumed, so no locks are taken.
pub struct IntoIter<K, V> {
    inner: std::iter::Flatten<std::vec::IntoIter<hashbrown::HashMap<K, V>>>,
}

impl<K, V> IntoIter<K, V> {
    pub(crate) fn new(tables: Vec<hashbrown::HashMap<K, V>>) -> Self {
        Self {
            inner: tables.into_iter().flatten(),
        }
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}
