use crate::error::Error;
use crate::stripedmap::MapKey;

/// Default number of shards. A power of two, so routing uses a mask.
pub const DEFAULT_SHARD_COUNT: usize = 32;

/// Default initial bucket capacity of each shard's table.
pub const DEFAULT_CAPACITY_PER_SHARD: usize = 16;

/// Which hash function to use for shard assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashFunction {
    /// Use ahash (default, fast and well-distributed).
    #[default]
    AHash,
    /// Use the standard library's SipHash (slower, DoS-resistant).
    Sip,
    /// Use fxhash (faster but potentially less distributed).
    #[cfg(feature = "fxhash")]
    FxHash,
}

/// User-provided shard selection. Enables stateful or custom routing.
///
/// Routers receive the *finalized* key hash. A router must be a pure
/// function of its inputs: the same key has to reach the same shard for the
/// lifetime of the map.
pub trait ShardRouter: Send + Sync {
    /// Return the shard index in `[0, shard_count)` for the given key hash.
    ///
    /// Out-of-range results are reduced modulo `shard_count`.
    fn route(&self, key_hash: u64, shard_count: usize) -> usize;
}

/// Default routing: `hash & (shard_count - 1)` for power-of-two shard
/// counts, `hash % shard_count` otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRouter;

impl ShardRouter for DefaultRouter {
    #[inline]
    fn route(&self, key_hash: u64, shard_count: usize) -> usize {
        if shard_count.is_power_of_two() {
            (key_hash as usize) & (shard_count - 1)
        } else {
            (key_hash % shard_count as u64) as usize
        }
    }
}

/// Routing strategy for shard selection.
#[derive(Default)]
pub enum RoutingConfig {
    /// Default: mask or modulo of the finalized hash.
    #[default]
    Default,
    /// User-provided router (e.g. stateful or custom distribution).
    Custom(Box<dyn ShardRouter>),
}

impl RoutingConfig {
    #[inline]
    pub(crate) fn route(&self, key_hash: u64, shard_count: usize) -> usize {
        match self {
            RoutingConfig::Default => DefaultRouter.route(key_hash, shard_count),
            RoutingConfig::Custom(router) => router.route(key_hash, shard_count) % shard_count,
        }
    }
}

impl std::fmt::Debug for RoutingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoutingConfig::Default => write!(f, "RoutingConfig::Default"),
            RoutingConfig::Custom(_) => write!(f, "RoutingConfig::Custom(...)"),
        }
    }
}

/// Configuration for a StripedMap instance. Fixed once the map is built.
#[derive(Debug)]
pub struct Config {
    pub(crate) shard_count: usize,
    pub(crate) hash_function: HashFunction,
    pub(crate) capacity_per_shard: usize,
    pub(crate) routing: RoutingConfig,
}

impl Config {
    /// Create a new config with defaults (32 shards, 16 buckets each, ahash).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of shards. Must be greater than 0.
    ///
    /// Any positive count is accepted; powers of two route with a bit mask
    /// instead of a modulo.
    pub fn shard_count(mut self, count: usize) -> Result<Self, Error> {
        if count == 0 {
            return Err(Error::InvalidShardCount);
        }
        self.shard_count = count;
        Ok(self)
    }

    /// Set the hash function to use.
    pub fn hash_function(mut self, hash_fn: HashFunction) -> Self {
        self.hash_function = hash_fn;
        self
    }

    /// Set initial capacity per shard. Total capacity will be approximately
    /// `capacity_per_shard * shard_count`.
    pub fn capacity_per_shard(mut self, capacity: usize) -> Self {
        self.capacity_per_shard = capacity;
        self
    }

    /// Use a custom shard router.
    pub fn routing(mut self, routing: RoutingConfig) -> Self {
        self.routing = routing;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shard_count: DEFAULT_SHARD_COUNT,
            hash_function: HashFunction::AHash,
            capacity_per_shard: DEFAULT_CAPACITY_PER_SHARD,
            routing: RoutingConfig::Default,
        }
    }
}

/// Builder for creating a StripedMap with custom configuration.
#[derive(Debug, Default)]
pub struct StripedMapBuilder {
    config: Config,
}

impl StripedMapBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of shards. Must be greater than 0.
    pub fn shard_count(mut self, count: usize) -> Result<Self, Error> {
        self.config = self.config.shard_count(count)?;
        Ok(self)
    }

    /// Set the hash function to use.
    pub fn hash_function(mut self, hash_fn: HashFunction) -> Self {
        self.config = self.config.hash_function(hash_fn);
        self
    }

    /// Set initial capacity per shard. Total capacity ≈ `capacity_per_shard * shard_count`.
    pub fn capacity_per_shard(mut self, capacity: usize) -> Self {
        self.config = self.config.capacity_per_shard(capacity);
        self
    }

    /// Use a custom shard router (e.g. for stateful or custom distribution).
    pub fn routing(mut self, routing: RoutingConfig) -> Self {
        self.config = self.config.routing(routing);
        self
    }

    /// Build a StripedMap with the configured settings.
    pub fn build<K, V>(self) -> Result<crate::StripedMap<K, V>, Error>
    where
        K: MapKey,
        V: Send + Sync,
    {
        crate::StripedMap::with_config(self.config)
    }
}
