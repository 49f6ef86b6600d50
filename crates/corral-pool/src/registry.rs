//! Named-pool registry.
//!
//! Deployments that pool several backends of the same kind (a primary and
//! a replica, tenant-scoped databases) need pools addressable by name.
//! Rather than a process-wide static with an unclear lifecycle, the
//! registry is an explicit object the caller owns and passes where it is
//! needed; dropping it drops the handles it holds.

use hashbrown::HashMap;
use parking_lot::Mutex;

use crate::backend::ConnectionBackend;
use crate::error::PoolError;
use crate::pool::Pool;

/// An explicit, caller-owned map of named pools.
///
/// Registration reserves the name under the lock before the pool handle
/// is stored, so two tasks racing to register the same name resolve to
/// exactly one winner; the loser gets
/// [`PoolError::DuplicateName`] and keeps its pool to dispose of.
pub struct PoolRegistry<B: ConnectionBackend> {
    pools: Mutex<HashMap<String, Pool<B>>>,
}

impl<B: ConnectionBackend> PoolRegistry<B> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pools: Mutex::new(HashMap::new()),
        }
    }

    /// Register a pool under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::DuplicateName`] if the name is taken; the
    /// registry is left unchanged and the caller still owns its pool.
    pub fn register(&self, name: impl Into<String>, pool: Pool<B>) -> Result<(), PoolError> {
        let name = name.into();
        let mut pools = self.pools.lock();
        if pools.contains_key(&name) {
            return Err(PoolError::DuplicateName(name));
        }
        tracing::debug!(name = %name, "pool registered");
        pools.insert(name, pool);
        Ok(())
    }

    /// Get a handle to the pool registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Pool<B>> {
        self.pools.lock().get(name).cloned()
    }

    /// Remove and return the pool registered under `name`.
    ///
    /// The pool itself is not closed; the caller decides when to call
    /// [`Pool::close_all`] on it.
    pub fn remove(&self, name: &str) -> Option<Pool<B>> {
        let removed = self.pools.lock().remove(name);
        if removed.is_some() {
            tracing::debug!(name, "pool deregistered");
        }
        removed
    }

    /// Names currently registered, in no particular order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.pools.lock().keys().cloned().collect()
    }

    /// Number of registered pools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pools.lock().len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pools.lock().is_empty()
    }

    /// Remove every pool and close each one.
    pub async fn close_all(&self) {
        let pools: Vec<(String, Pool<B>)> = self.pools.lock().drain().collect();
        for (name, pool) in pools {
            tracing::info!(name = %name, "closing registered pool");
            pool.close_all().await;
        }
    }
}

impl<B: ConnectionBackend> Default for PoolRegistry<B> {
    fn default() -> Self {
        Self::new()
    }
}
