//! Redis adapter over the `redis` crate.

use std::time::Duration;

use async_trait::async_trait;
use corral_pool::ConnectionBackend;

use ::redis::aio::MultiplexedConnection;
use ::redis::{Client, ConnectionAddr, ConnectionInfo, RedisConnectionInfo, RedisResult};

use crate::config::BackendConfig;

const DEFAULT_PORT: u16 = 6379;

/// Pool backend for Redis-compatible key-value servers.
///
/// Probes with `PING`. The `database` field of [`BackendConfig`] is read
/// as a numeric database index for `SELECT`; authentication uses the
/// optional username/password pair (`AUTH`).
pub struct RedisBackend {
    client: Client,
    connect_timeout: Duration,
}

impl RedisBackend {
    /// Build the adapter from shared backend parameters.
    ///
    /// # Errors
    ///
    /// Returns the driver's error if the parameters do not form a valid
    /// Redis target; this is construction-time misconfiguration, not a
    /// runtime connectivity failure.
    pub fn new(config: BackendConfig) -> RedisResult<Self> {
        let info = ConnectionInfo {
            addr: ConnectionAddr::Tcp(config.host.clone(), config.port.unwrap_or(DEFAULT_PORT)),
            redis: RedisConnectionInfo {
                db: config
                    .database
                    .as_deref()
                    .and_then(|db| db.parse().ok())
                    .unwrap_or(0),
                username: config.username.clone(),
                password: config.password.clone(),
                ..Default::default()
            },
        };
        Ok(Self {
            client: Client::open(info)?,
            connect_timeout: config.connect_timeout(),
        })
    }

    /// The connection target this adapter dials.
    #[must_use]
    pub fn connection_info(&self) -> &ConnectionInfo {
        self.client.get_connection_info()
    }
}

#[async_trait]
impl ConnectionBackend for RedisBackend {
    type Conn = MultiplexedConnection;

    async fn open(&self) -> Option<MultiplexedConnection> {
        let connect = self.client.get_multiplexed_async_connection();
        match tokio::time::timeout(self.connect_timeout, connect).await {
            Ok(Ok(conn)) => Some(conn),
            Ok(Err(error)) => {
                tracing::warn!(%error, "redis connect failed");
                None
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.connect_timeout.as_millis() as u64,
                    "redis connect timed out"
                );
                None
            }
        }
    }

    async fn probe(&self, conn: &mut MultiplexedConnection) -> bool {
        let pong: RedisResult<String> = ::redis::cmd("PING").query_async(conn).await;
        matches!(pong.as_deref(), Ok("PONG"))
    }

    async fn close(&self, conn: MultiplexedConnection) {
        // The multiplexed connection hangs up when the last clone drops.
        drop(conn);
    }
}
