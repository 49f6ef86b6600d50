//! MySQL adapter over `mysql_async`.

use std::time::Duration;

use async_trait::async_trait;
use corral_pool::ConnectionBackend;
use mysql_async::prelude::Queryable;
use mysql_async::{Conn, Opts, OptsBuilder};

use crate::config::BackendConfig;

const DEFAULT_PORT: u16 = 3306;

/// Pool backend for MySQL-compatible servers.
///
/// Probes with the protocol's `COM_PING`, the cheapest round trip MySQL
/// offers.
pub struct MySqlBackend {
    opts: Opts,
    connect_timeout: Duration,
}

impl MySqlBackend {
    /// Build the adapter from shared backend parameters.
    #[must_use]
    pub fn new(config: BackendConfig) -> Self {
        let opts: Opts = OptsBuilder::default()
            .ip_or_hostname(config.host.clone())
            .tcp_port(config.port.unwrap_or(DEFAULT_PORT))
            .user(config.username.clone())
            .pass(config.password.clone())
            .db_name(config.database.clone())
            .into();
        Self {
            opts,
            connect_timeout: config.connect_timeout(),
        }
    }

    /// The driver options this adapter connects with.
    #[must_use]
    pub fn opts(&self) -> &Opts {
        &self.opts
    }
}

#[async_trait]
impl ConnectionBackend for MySqlBackend {
    type Conn = Conn;

    async fn open(&self) -> Option<Conn> {
        match tokio::time::timeout(self.connect_timeout, Conn::new(self.opts.clone())).await {
            Ok(Ok(conn)) => Some(conn),
            Ok(Err(error)) => {
                tracing::warn!(%error, "mysql connect failed");
                None
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.connect_timeout.as_millis() as u64,
                    "mysql connect timed out"
                );
                None
            }
        }
    }

    async fn probe(&self, conn: &mut Conn) -> bool {
        conn.ping().await.is_ok()
    }

    async fn close(&self, conn: Conn) {
        if let Err(error) = conn.disconnect().await {
            tracing::debug!(%error, "mysql disconnect reported an error");
        }
    }
}
