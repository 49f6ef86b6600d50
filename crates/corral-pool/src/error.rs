//! Pool error types.

use thiserror::Error;

/// Errors surfaced by the pool's constructors and the registry.
///
/// Runtime connectivity failures and saturation are deliberately *not*
/// here: they are encoded as `None` returns from
/// [`Pool::acquire`](crate::Pool::acquire) so callers handle them as
/// expected outcomes rather than exceptions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    /// The configured capacity was zero.
    #[error("pool capacity must be greater than 0")]
    ZeroCapacity,

    /// More warm-up connections were requested than the pool can hold.
    #[error("min_connections ({min}) exceeds capacity ({capacity})")]
    MinExceedsCapacity {
        /// Requested warm-up connection count.
        min: usize,
        /// Configured pool capacity.
        capacity: usize,
    },

    /// The acquire timeout was zero.
    #[error("acquire timeout must be greater than 0")]
    ZeroAcquireTimeout,

    /// A pool with this name is already registered.
    #[error("a pool named {0:?} is already registered")]
    DuplicateName(String),
}
