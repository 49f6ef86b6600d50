//! Pool configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PoolError;

/// Configuration for a [`Pool`](crate::Pool).
///
/// Values are fixed for the pool's lifetime; there is no hot reload.
/// Timeouts are stored in milliseconds so the struct deserializes cleanly
/// from an external configuration loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Hard cap on live connections.
    capacity: usize,
    /// Connections pre-opened at build time. Defaults to half the
    /// capacity, rounded up, matching the lazily-grown steady state most
    /// deployments settle into.
    min_connections: Option<usize>,
    /// How long an acquirer waits for an idle connection.
    acquire_timeout_ms: u64,
}

impl PoolConfig {
    /// Create a configuration with the given capacity and defaults for
    /// everything else.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            min_connections: None,
            acquire_timeout_ms: 5_000,
        }
    }

    /// Set the hard cap on live connections.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the number of connections opened eagerly at build time.
    #[must_use]
    pub fn with_min_connections(mut self, min: usize) -> Self {
        self.min_connections = Some(min);
        self
    }

    /// Set the caller-facing acquire timeout.
    #[must_use]
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Hard cap on live connections.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of connections to pre-open at build time.
    #[must_use]
    pub fn min_connections(&self) -> usize {
        self.min_connections.unwrap_or_else(|| self.capacity.div_ceil(2))
    }

    /// Caller-facing acquire timeout.
    #[must_use]
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    /// Validate the configuration.
    ///
    /// Called once at pool construction; misconfiguration is the only
    /// condition the pool surfaces as an error rather than a `None`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::ZeroCapacity`], [`PoolError::ZeroAcquireTimeout`],
    /// or [`PoolError::MinExceedsCapacity`].
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.capacity == 0 {
            return Err(PoolError::ZeroCapacity);
        }
        if self.acquire_timeout_ms == 0 {
            return Err(PoolError::ZeroAcquireTimeout);
        }
        let min = self.min_connections();
        if min > self.capacity {
            return Err(PoolError::MinExceedsCapacity {
                min,
                capacity: self.capacity,
            });
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new(10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = PoolConfig::default();
        assert_eq!(config.capacity(), 10);
        assert_eq!(config.min_connections(), 5);
        assert_eq!(config.acquire_timeout(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn min_connections_defaults_to_half_rounded_up() {
        assert_eq!(PoolConfig::new(1).min_connections(), 1);
        assert_eq!(PoolConfig::new(5).min_connections(), 3);
        assert_eq!(PoolConfig::new(20).min_connections(), 10);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert_eq!(PoolConfig::new(0).validate(), Err(PoolError::ZeroCapacity));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = PoolConfig::new(4).with_acquire_timeout(Duration::ZERO);
        assert_eq!(config.validate(), Err(PoolError::ZeroAcquireTimeout));
    }

    #[test]
    fn oversized_warmup_is_rejected() {
        let config = PoolConfig::new(4).with_min_connections(5);
        assert_eq!(
            config.validate(),
            Err(PoolError::MinExceedsCapacity { min: 5, capacity: 4 })
        );
    }

    #[test]
    fn deserializes_from_loader_output() {
        let config: PoolConfig = serde_json::from_str(
            r#"{"capacity": 8, "min_connections": 2, "acquire_timeout_ms": 250}"#,
        )
        .unwrap();
        assert_eq!(config.capacity(), 8);
        assert_eq!(config.min_connections(), 2);
        assert_eq!(config.acquire_timeout(), Duration::from_millis(250));
    }
}
