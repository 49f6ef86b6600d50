//! The backend capability the pool is parameterized over.

use std::sync::Arc;

use async_trait::async_trait;

/// Protocol-specific connection operations, injected into the pool.
///
/// One implementation exists per backend kind (relational SQL, key-value,
/// ...); the generic pool composes over this trait rather than inheriting
/// from any concrete client.
///
/// Connectivity failures are part of normal operation for a pool, so this
/// boundary encodes them as values instead of errors: `open` yields
/// `None`, `probe` yields `false`, and `close` is infallible. Adapters
/// are expected to log the underlying cause before swallowing it.
#[async_trait]
pub trait ConnectionBackend: Send + Sync + 'static {
    /// The live session handle this backend produces.
    type Conn: Send + 'static;

    /// Establish a new session from the backend's configuration.
    ///
    /// Returns `None` on any connection failure (network unreachable,
    /// authentication rejected, timeout) so the pool can treat failed
    /// creation uniformly.
    async fn open(&self) -> Option<Self::Conn>;

    /// Issue the cheapest possible round trip and report whether the
    /// connection is still usable. Must not panic; any error during the
    /// probe is `false`.
    async fn probe(&self, conn: &mut Self::Conn) -> bool;

    /// Release backend resources. Idempotent with respect to an already
    /// dead session.
    async fn close(&self, conn: Self::Conn);
}

#[async_trait]
impl<T: ConnectionBackend + ?Sized> ConnectionBackend for Arc<T> {
    type Conn = T::Conn;

    async fn open(&self) -> Option<Self::Conn> {
        (**self).open().await
    }

    async fn probe(&self, conn: &mut Self::Conn) -> bool {
        (**self).probe(conn).await
    }

    async fn close(&self, conn: Self::Conn) {
        (**self).close(conn).await;
    }
}
