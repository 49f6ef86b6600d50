//! Generic connection pool implementation.
//!
//! One pool instance is shared by any number of cooperative tasks within a
//! runtime. Deployments with multiple worker processes run one independent
//! pool per process; nothing here is shared across process boundaries.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use corral_sync::{AtomicCounter, BoundedChannel};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::backend::ConnectionBackend;
use crate::config::PoolConfig;
use crate::error::PoolError;

/// Internal handoff timeout for returning a connection to the idle
/// channel. Distinct from the caller-facing acquire timeout: a releasing
/// caller should never be held up for long, and a full channel at release
/// time is a transient race that closing the connection resolves.
const RELEASE_TIMEOUT: Duration = Duration::from_millis(100);

/// A bounded pool of live backend connections.
///
/// The pool serves acquirers from an idle channel, grows lazily up to a
/// hard capacity, and evicts connections whose liveness probe fails.
/// Capacity accounting follows a reserve-then-act discipline: a creator
/// claims a slot in the live-connection counter *before* the expensive
/// open call and rolls the claim back if it lost the race or the backend
/// refused, so the count never durably exceeds the capacity.
///
/// `Pool` is a cheap handle; clones share the same state.
///
/// # Example
///
/// ```rust,ignore
/// let pool = Pool::builder(backend).capacity(8).build().await?;
///
/// let Some(conn) = pool.acquire().await else {
///     // saturated or backend unreachable
///     return Err(ServiceUnavailable);
/// };
/// // ... use `conn` ...
/// pool.release(conn).await;
/// ```
pub struct Pool<B: ConnectionBackend> {
    inner: Arc<PoolInner<B>>,
}

impl<B: ConnectionBackend> Clone for Pool<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct PoolInner<B: ConnectionBackend> {
    /// Pool configuration, fixed at construction.
    config: PoolConfig,

    /// Protocol-specific open/probe/close operations.
    backend: B,

    /// Live-connection count. Transiently reaches `capacity + 1` inside a
    /// losing creation race, which the loser immediately rolls back.
    current_size: AtomicCounter,

    /// Connections not currently checked out by any caller.
    idle: BoundedChannel<B::Conn>,

    /// Set by [`Pool::close_all`]; acquires observe it and bail out.
    closed: AtomicBool,

    /// When the pool was created.
    created_at: Instant,

    /// Pool metrics.
    metrics: Mutex<PoolMetricsInner>,
}

/// Internal metrics tracking.
#[derive(Debug, Default)]
struct PoolMetricsInner {
    /// Total connections opened.
    connections_created: u64,
    /// Total connections closed.
    connections_closed: u64,
    /// Total successful checkouts.
    checkouts_successful: u64,
    /// Total failed checkouts (timeouts, closed pool).
    checkouts_failed: u64,
    /// Total liveness probes performed.
    probes_performed: u64,
    /// Total liveness probe failures.
    probes_failed: u64,
}

impl<B: ConnectionBackend> Pool<B> {
    /// Create a pool builder around the given backend.
    #[must_use]
    pub fn builder(backend: B) -> PoolBuilder<B> {
        PoolBuilder::new(backend)
    }

    /// Create a pool with the given configuration.
    ///
    /// No connections are opened here; use [`Pool::builder`] (whose async
    /// `build` also warms the pool) or call [`Pool::warm_up`] explicitly.
    ///
    /// # Errors
    ///
    /// Returns a [`PoolError`] if the configuration is invalid.
    pub fn new(config: PoolConfig, backend: B) -> Result<Self, PoolError> {
        config.validate()?;

        let inner = Arc::new(PoolInner {
            idle: BoundedChannel::new(config.capacity()),
            current_size: AtomicCounter::new(0),
            closed: AtomicBool::new(false),
            created_at: Instant::now(),
            metrics: Mutex::new(PoolMetricsInner::default()),
            backend,
            config,
        });

        tracing::info!(
            capacity = inner.config.capacity(),
            acquire_timeout_ms = inner.config.acquire_timeout().as_millis() as u64,
            "connection pool created"
        );

        Ok(Self { inner })
    }

    /// Acquire a connection from the pool.
    ///
    /// Serves from the idle channel when possible, opens a fresh
    /// connection when the pool is below capacity, and otherwise waits for
    /// a peer to release one. A connection pulled from the idle channel is
    /// probed before being handed out; dead connections are discarded and
    /// replaced transparently.
    ///
    /// Returns `None` when the pool stayed saturated for the whole
    /// timeout, the backend refused a new connection, or the pool is
    /// closed. The caller decides whether to fail the request, retry, or
    /// fall back to an unpooled connection.
    pub async fn acquire(&self) -> Option<PooledConnection<B>> {
        let inner = &self.inner;

        if inner.closed.load(Ordering::Acquire) {
            tracing::debug!("acquire on closed pool");
            inner.note_checkout(false);
            return None;
        }

        tracing::trace!("acquiring connection from pool");
        let timeout = inner.config.acquire_timeout();

        if let Some(mut conn) = inner.idle.pop(timeout).await {
            if inner.probe(&mut conn).await {
                inner.note_checkout(true);
                return Some(PooledConnection::new(conn, Arc::clone(inner)));
            }
            // Dead idle connection: evict it, then try to open a
            // replacement below.
            tracing::debug!("evicting dead idle connection");
            inner.discard(conn).await;
        }

        if inner.current_size.get() < inner.capacity() {
            if let Some(conn) = inner.try_create().await {
                inner.note_checkout(true);
                return Some(PooledConnection::new(conn, Arc::clone(inner)));
            }
        }

        // At capacity (or creation lost its race / was refused): grant one
        // more wait for a peer to release. No second probe on this path;
        // the connection went through one on its way into the channel.
        match inner.idle.pop(timeout).await {
            Some(conn) => {
                inner.note_checkout(true);
                Some(PooledConnection::new(conn, Arc::clone(inner)))
            }
            None => {
                inner.note_checkout(false);
                tracing::debug!(
                    timeout_ms = timeout.as_millis() as u64,
                    "pool saturated; acquire timed out"
                );
                None
            }
        }
    }

    /// Return a connection to the pool, deterministically.
    ///
    /// The connection is probed and either handed to the idle channel or
    /// closed. Dropping the [`PooledConnection`] guard performs the same
    /// return on a spawned task; this method is for callers that want the
    /// handoff completed before proceeding.
    pub async fn release(&self, mut conn: PooledConnection<B>) {
        if let Some(raw) = conn.conn.take() {
            self.inner.release_conn(raw).await;
        }
    }

    /// Pre-open the configured minimum number of connections.
    ///
    /// Returns how many were actually opened. Failures are tolerated; the
    /// pool simply starts smaller and grows on demand.
    pub async fn warm_up(&self) -> usize {
        let target = self.inner.config.min_connections();
        let mut opened = 0;

        for _ in 0..target {
            let Some(conn) = self.inner.try_create().await else {
                break;
            };
            if let Err(conn) = self.inner.idle.push(conn, RELEASE_TIMEOUT).await {
                self.inner.discard(conn).await;
                break;
            }
            opened += 1;
        }

        if opened < target {
            tracing::warn!(opened, target, "pool warm-up fell short");
        } else if opened > 0 {
            tracing::debug!(opened, "pool warmed up");
        }
        opened
    }

    /// Snapshot of the pool's occupancy.
    ///
    /// The underlying reads are independent, so the snapshot is an
    /// eventually-consistent approximation under heavy churn, suitable
    /// for monitoring rather than exact accounting. `in_use` may even be
    /// transiently negative.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        let current = self.inner.current_size.get();
        let available = self.inner.idle.len();
        PoolStats {
            capacity: self.inner.config.capacity(),
            current,
            available,
            in_use: current - available as i64,
        }
    }

    /// Snapshot of the pool's lifetime counters.
    #[must_use]
    pub fn metrics(&self) -> PoolMetrics {
        let inner = self.inner.metrics.lock();
        PoolMetrics {
            connections_created: inner.connections_created,
            connections_closed: inner.connections_closed,
            checkouts_successful: inner.checkouts_successful,
            checkouts_failed: inner.checkouts_failed,
            probes_performed: inner.probes_performed,
            probes_failed: inner.probes_failed,
            uptime: self.inner.created_at.elapsed(),
        }
    }

    /// Close the pool: drain the idle channel, close every drained
    /// connection, and reset the live count.
    ///
    /// Connections checked out at the time of this call are not tracked by
    /// the pool and must be closed by their holders (dropping their guard
    /// does so). Subsequent acquires return `None`.
    pub async fn close_all(&self) {
        self.inner.closed.store(true, Ordering::Release);

        let mut drained = 0u64;
        while let Some(conn) = self.inner.idle.try_pop() {
            self.inner.backend.close(conn).await;
            drained += 1;
        }
        self.inner.metrics.lock().connections_closed += drained;
        self.inner.current_size.set(0);

        tracing::info!(drained, "connection pool closed");
    }

    /// Whether [`Pool::close_all`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// The pool configuration.
    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }
}

impl<B: ConnectionBackend> PoolInner<B> {
    fn capacity(&self) -> i64 {
        self.config.capacity() as i64
    }

    /// Open a new connection under the reserve-then-act discipline.
    ///
    /// The slot is claimed with an atomic increment *before* the expensive
    /// open call; a claim that lands above capacity lost a concurrent race
    /// and is rolled back immediately, as is a claim whose open the
    /// backend refused. Either way the failure is reported as `None`.
    async fn try_create(&self) -> Option<B::Conn> {
        let reserved = self.current_size.increment();
        if reserved > self.capacity() {
            self.current_size.decrement();
            tracing::trace!("lost creation race; reservation rolled back");
            return None;
        }

        match self.backend.open().await {
            Some(conn) => {
                self.metrics.lock().connections_created += 1;
                tracing::debug!(current = reserved, "opened new connection");
                Some(conn)
            }
            None => {
                self.current_size.decrement();
                tracing::warn!("backend refused new connection; reservation rolled back");
                None
            }
        }
    }

    /// Probe a connection, tracking the outcome.
    async fn probe(&self, conn: &mut B::Conn) -> bool {
        let alive = self.backend.probe(conn).await;
        let mut metrics = self.metrics.lock();
        metrics.probes_performed += 1;
        if !alive {
            metrics.probes_failed += 1;
        }
        alive
    }

    /// Drop a connection out of the pool's accounting and close it.
    async fn discard(&self, conn: B::Conn) {
        self.current_size.decrement();
        self.backend.close(conn).await;
        self.metrics.lock().connections_closed += 1;
    }

    /// Return path shared by [`Pool::release`] and the guard's `Drop`.
    async fn release_conn(&self, mut conn: B::Conn) {
        if self.closed.load(Ordering::Acquire) {
            // The pool already reset its accounting; the holder just
            // closes what it holds.
            self.backend.close(conn).await;
            return;
        }

        if !self.probe(&mut conn).await {
            tracing::debug!("released connection failed probe; closing");
            self.discard(conn).await;
            return;
        }

        if let Err(conn) = self.idle.push(conn, RELEASE_TIMEOUT).await {
            // The channel can be momentarily full when in-flight creations
            // race a burst of releases. Closing beats leaking.
            tracing::debug!("idle channel full on release; closing connection");
            self.discard(conn).await;
        }
    }

    fn note_checkout(&self, success: bool) {
        let mut metrics = self.metrics.lock();
        if success {
            metrics.checkouts_successful += 1;
        } else {
            metrics.checkouts_failed += 1;
        }
    }
}

/// Builder for a [`Pool`].
///
/// # Example
///
/// ```rust,ignore
/// let pool = Pool::builder(backend)
///     .capacity(20)
///     .min_connections(5)
///     .acquire_timeout(Duration::from_secs(5))
///     .build()
///     .await?;
/// ```
pub struct PoolBuilder<B: ConnectionBackend> {
    config: PoolConfig,
    backend: B,
}

impl<B: ConnectionBackend> PoolBuilder<B> {
    /// Create a builder with default settings around the given backend.
    pub fn new(backend: B) -> Self {
        Self {
            config: PoolConfig::default(),
            backend,
        }
    }

    /// Replace the whole pool configuration.
    #[must_use]
    pub fn config(mut self, config: PoolConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the hard cap on live connections.
    #[must_use]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config = self.config.with_capacity(capacity);
        self
    }

    /// Set the number of connections opened eagerly by `build`.
    #[must_use]
    pub fn min_connections(mut self, min: usize) -> Self {
        self.config = self.config.with_min_connections(min);
        self
    }

    /// Set the caller-facing acquire timeout.
    #[must_use]
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_acquire_timeout(timeout);
        self
    }

    /// Build the pool and warm it up to the configured minimum.
    ///
    /// # Errors
    ///
    /// Returns a [`PoolError`] if the configuration is invalid. Warm-up
    /// connection failures are not errors; the pool starts smaller.
    pub async fn build(self) -> Result<Pool<B>, PoolError> {
        let pool = Pool::new(self.config, self.backend)?;
        pool.warm_up().await;
        Ok(pool)
    }
}

/// Eventually-consistent snapshot of pool occupancy.
///
/// `current` and `available` are read independently, so `in_use` can be
/// momentarily inconsistent (even negative) under concurrent churn. Treat
/// all fields as monitoring signals, not exact counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    /// Maximum allowed live connections.
    pub capacity: usize,
    /// Live connections (idle plus checked out).
    pub current: i64,
    /// Connections sitting in the idle channel.
    pub available: usize,
    /// Connections currently checked out (`current - available`).
    pub in_use: i64,
}

impl PoolStats {
    /// Fraction of capacity currently checked out, `0.0..=1.0`.
    #[must_use]
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        (self.in_use.max(0) as f64 / self.capacity as f64).min(1.0)
    }

    /// Whether the live count has reached capacity.
    #[must_use]
    pub fn is_at_capacity(&self) -> bool {
        self.current >= self.capacity as i64
    }
}

/// Lifetime counters collected by the pool.
#[derive(Debug, Clone)]
pub struct PoolMetrics {
    /// Connections opened since pool creation.
    pub connections_created: u64,
    /// Connections closed since pool creation.
    pub connections_closed: u64,
    /// Successful checkouts.
    pub checkouts_successful: u64,
    /// Failed checkouts (timeouts, closed pool).
    pub checkouts_failed: u64,
    /// Liveness probes performed.
    pub probes_performed: u64,
    /// Liveness probes that failed.
    pub probes_failed: u64,
    /// Time since pool creation.
    pub uptime: Duration,
}

impl PoolMetrics {
    /// Checkout success rate, `0.0..=1.0`.
    #[must_use]
    pub fn checkout_success_rate(&self) -> f64 {
        let total = self.checkouts_successful + self.checkouts_failed;
        if total == 0 {
            return 1.0;
        }
        self.checkouts_successful as f64 / total as f64
    }

    /// Probe success rate, `0.0..=1.0`.
    #[must_use]
    pub fn probe_success_rate(&self) -> f64 {
        if self.probes_performed == 0 {
            return 1.0;
        }
        let successful = self.probes_performed - self.probes_failed;
        successful as f64 / self.probes_performed as f64
    }
}

/// A connection checked out of a [`Pool`].
///
/// Dereferences to the backend connection. On drop, the connection is
/// returned to the pool on a spawned task; use
/// [`Pool::release`] when the return must complete before the caller
/// proceeds, or [`detach`](Self::detach) to take the connection out of the
/// pool's accounting entirely.
pub struct PooledConnection<B: ConnectionBackend> {
    conn: Option<B::Conn>,
    pool: Arc<PoolInner<B>>,
}

impl<B: ConnectionBackend> PooledConnection<B> {
    fn new(conn: B::Conn, pool: Arc<PoolInner<B>>) -> Self {
        Self {
            conn: Some(conn),
            pool,
        }
    }

    /// Remove the connection from the pool's accounting and hand it to
    /// the caller, freeing its capacity slot for a replacement. The caller
    /// owns the connection from here on, including closing it.
    #[must_use]
    pub fn detach(mut self) -> B::Conn {
        self.pool.current_size.decrement();
        #[allow(clippy::expect_used)] // present until drop, and this consumes self
        self.conn.take().expect("connection present until drop")
    }
}

impl<B: ConnectionBackend> Deref for PooledConnection<B> {
    type Target = B::Conn;

    #[allow(clippy::expect_used)] // present until drop
    fn deref(&self) -> &Self::Target {
        self.conn.as_ref().expect("connection present until drop")
    }
}

impl<B: ConnectionBackend> DerefMut for PooledConnection<B> {
    #[allow(clippy::expect_used)] // present until drop
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.conn.as_mut().expect("connection present until drop")
    }
}

impl<B: ConnectionBackend> Drop for PooledConnection<B> {
    fn drop(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        let pool = Arc::clone(&self.pool);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    pool.release_conn(conn).await;
                });
            }
            Err(_) => {
                // Dropped outside a runtime; the async close cannot run.
                // Keep the accounting truthful and let the handle drop.
                pool.current_size.decrement();
                tracing::warn!("pooled connection dropped outside a runtime");
            }
        }
    }
}
