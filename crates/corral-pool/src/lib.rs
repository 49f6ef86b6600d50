//! # corral-pool
//!
//! A bounded, task-safe, lazily-growing connection pool for async Rust.
//!
//! The pool hands live connections to callers with minimal contention,
//! opens new connections on demand up to a hard capacity, transparently
//! evicts connections whose liveness probe fails, and never lets the
//! live-connection count durably exceed the configured capacity, even
//! under concurrent creation races.
//!
//! Protocol specifics are injected through the [`ConnectionBackend`]
//! capability (open / probe / close); ready-made adapters for common
//! backends live in the `corral-backends` crate.
//!
//! ## Failure model
//!
//! Backend connectivity failures are never raised from the pool's public
//! surface. A failed open or probe is absorbed into rollback actions, and
//! the only failure a caller observes is `None` from [`Pool::acquire`]:
//! the pool is saturated or the backend is unreachable, and the caller
//! picks the fallback policy. Errors proper are reserved for
//! misconfiguration detected at construction time.
//!
//! ## Example
//!
//! ```rust,ignore
//! use corral_pool::{Pool, PoolConfig};
//!
//! let pool = Pool::builder(backend)
//!     .capacity(20)
//!     .acquire_timeout(Duration::from_secs(5))
//!     .build()
//!     .await?;
//!
//! match pool.acquire().await {
//!     Some(conn) => {
//!         // Use the connection; it returns to the pool on drop,
//!         // or deterministically via `pool.release(conn).await`.
//!     }
//!     None => {
//!         // Saturated or unreachable; retry, fall back, or surface
//!         // service-unavailable upstream.
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod backend;
pub mod config;
pub mod error;
pub mod pool;
pub mod registry;

// Capability seam
pub use backend::ConnectionBackend;

// Configuration
pub use config::PoolConfig;

// Error types
pub use error::PoolError;

// Pool types
pub use pool::{Pool, PoolBuilder, PoolMetrics, PoolStats, PooledConnection};

// Named-pool registry
pub use registry::PoolRegistry;

// Re-export the primitives for callers that build their own coordination.
pub use corral_sync::{AtomicCounter, BoundedChannel};
