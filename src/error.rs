use thiserror::Error;

/// Errors that can occur when building or growing a StripedMap.
///
/// Key absence is never an error; lookups report it through `Option` or `bool`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The shard count is invalid (must be greater than 0).
    #[error("shard count must be greater than 0")]
    InvalidShardCount,
    /// The requested capacity exceeds what a shard table can address.
    #[error("requested capacity exceeds the maximum table size")]
    CapacityOverflow,
    /// The allocator refused to grow a shard table.
    #[error("failed to allocate {size} bytes for shard table")]
    AllocError {
        /// Size in bytes of the refused allocation.
        size: usize,
    },
}

impl From<hashbrown::TryReserveError> for Error {
    fn from(err: hashbrown::TryReserveError) -> Self {
        match err {
            hashbrown::TryReserveError::CapacityOverflow => Error::CapacityOverflow,
            hashbrown::TryReserveError::AllocError { layout } => Error::AllocError {
                size: layout.size(),
            },
        }
    }
}
