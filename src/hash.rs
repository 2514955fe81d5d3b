use crate::config::HashFunction;
use std::hash::{Hash, Hasher};

/// Splitmix64 finalizer.
///
/// Spreads the entropy of a raw hash code across all 64 bits, so that
/// masking the low bits for shard selection stays balanced even when the
/// key type's `Hash` impl only varies the high bits.
#[inline]
pub fn finalize(mut h: u64) -> u64 {
    h = (h ^ (h >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    h = (h ^ (h >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    h ^ (h >> 31)
}

/// Hash function implementation for shard assignment.
/// Uses an enum to avoid trait object limitations with generics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShardHasher {
    /// AHash with fixed keys (default, fast and well-distributed).
    #[default]
    AHash,
    /// SipHash-1-3 from the standard library.
    Sip,
    /// FxHash implementation (faster but potentially less distributed).
    #[cfg(feature = "fxhash")]
    FxHash,
}

impl ShardHasher {
    /// Raw hash of a key, before finalization.
    pub fn hash_key<Q: Hash + ?Sized>(&self, key: &Q) -> u64 {
        match self {
            ShardHasher::AHash => {
                let mut hasher = ahash::AHasher::default();
                key.hash(&mut hasher);
                hasher.finish()
            }
            ShardHasher::Sip => {
                let mut hasher = std::collections::hash_map::DefaultHasher::new();
                key.hash(&mut hasher);
                hasher.finish()
            }
            #[cfg(feature = "fxhash")]
            ShardHasher::FxHash => {
                let mut hasher = fxhash::FxHasher::default();
                key.hash(&mut hasher);
                hasher.finish()
            }
        }
    }

    /// Finalized hash used for routing a key to its shard.
    #[inline]
    pub fn shard_hash<Q: Hash + ?Sized>(&self, key: &Q) -> u64 {
        finalize(self.hash_key(key))
    }
}

impl From<HashFunction> for ShardHasher {
    fn from(hash_fn: HashFunction) -> Self {
        match hash_fn {
            HashFunction::AHash => ShardHasher::AHash,
            HashFunction::Sip => ShardHasher::Sip,
            #[cfg(feature = "fxhash")]
            HashFunction::FxHash => ShardHasher::FxHash,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finalize_known_values() {
        assert_eq!(finalize(0), 0);
        // splitmix64 output for state 0x9e3779b97f4a7c15 (first step from seed 0)
        assert_eq!(finalize(0x9e37_79b9_7f4a_7c15), 0xe220_a839_7b1d_cdaf);
    }

    #[test]
    fn test_finalize_spreads_high_bit_entropy() {
        // Hash codes that differ only above bit 32 must still land in
        // different low-bit buckets.
        let mut buckets = [0usize; 16];
        for i in 0..1024u64 {
            let h = finalize(i << 40);
            buckets[(h & 15) as usize] += 1;
        }
        for count in buckets {
            assert!(count > 20, "bucket count too low: {}", count);
        }
    }

    #[test]
    fn test_hash_key_is_deterministic() {
        #[allow(unused_mut)]
        let mut hashers = vec![ShardHasher::AHash, ShardHasher::Sip];
        #[cfg(feature = "fxhash")]
        hashers.push(ShardHasher::from(HashFunction::FxHash));

        for hasher in hashers {
            assert_eq!(hasher.hash_key("key"), hasher.hash_key("key"));
            assert_eq!(hasher.shard_hash(&42u64), hasher.shard_hash(&42u64));
        }
    }

    #[test]
    fn test_borrowed_key_hashes_like_owned() {
        let owned = String::from("borrowed");
        let hasher = ShardHasher::default();
        assert_eq!(hasher.shard_hash(&owned), hasher.shard_hash("borrowed"));
    }
}
