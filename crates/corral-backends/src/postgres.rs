//! PostgreSQL adapter over `tokio-postgres`.

use std::time::Duration;

use async_trait::async_trait;
use corral_pool::ConnectionBackend;
use tokio::task::JoinHandle;
use tokio_postgres::NoTls;

use crate::config::BackendConfig;

/// Pool backend for PostgreSQL servers.
///
/// Probes with `SELECT 1` over the simple-query protocol.
pub struct PostgresBackend {
    conninfo: String,
    connect_timeout: Duration,
}

/// A live PostgreSQL session.
///
/// `tokio-postgres` splits a session into a client handle and a
/// connection driver future; the driver runs on its own task and exits
/// when the client is dropped.
pub struct PostgresConn {
    client: tokio_postgres::Client,
    driver: JoinHandle<()>,
}

impl PostgresConn {
    /// The query interface of this session.
    #[must_use]
    pub fn client(&self) -> &tokio_postgres::Client {
        &self.client
    }
}

impl PostgresBackend {
    /// Build the adapter from shared backend parameters.
    #[must_use]
    pub fn new(config: BackendConfig) -> Self {
        Self {
            conninfo: build_conninfo(&config),
            connect_timeout: config.connect_timeout(),
        }
    }

    /// The libpq-style connection string this adapter connects with.
    #[must_use]
    pub fn conninfo(&self) -> &str {
        &self.conninfo
    }
}

/// Render a libpq-style conninfo string, skipping absent parameters.
fn build_conninfo(config: &BackendConfig) -> String {
    let mut parts = vec![format!("host={}", config.host)];
    if let Some(port) = config.port {
        parts.push(format!("port={port}"));
    }
    if let Some(database) = &config.database {
        parts.push(format!("dbname={database}"));
    }
    if let Some(username) = &config.username {
        parts.push(format!("user={username}"));
    }
    if let Some(password) = &config.password {
        parts.push(format!("password={password}"));
    }
    parts.push(format!(
        "connect_timeout={}",
        config.connect_timeout().as_secs().max(1)
    ));
    parts.join(" ")
}

#[async_trait]
impl ConnectionBackend for PostgresBackend {
    type Conn = PostgresConn;

    async fn open(&self) -> Option<PostgresConn> {
        let connect = tokio_postgres::connect(&self.conninfo, NoTls);
        match tokio::time::timeout(self.connect_timeout, connect).await {
            Ok(Ok((client, connection))) => {
                // The driver future owns the socket; it resolves once the
                // client side is dropped.
                let driver = tokio::spawn(async move {
                    if let Err(error) = connection.await {
                        tracing::debug!(%error, "postgres connection task ended with error");
                    }
                });
                Some(PostgresConn { client, driver })
            }
            Ok(Err(error)) => {
                tracing::warn!(%error, "postgres connect failed");
                None
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.connect_timeout.as_millis() as u64,
                    "postgres connect timed out"
                );
                None
            }
        }
    }

    async fn probe(&self, conn: &mut PostgresConn) -> bool {
        if conn.client.is_closed() {
            return false;
        }
        conn.client.simple_query("SELECT 1").await.is_ok()
    }

    async fn close(&self, conn: PostgresConn) {
        // Dropping the client hangs up; the driver task drains and exits.
        drop(conn.client);
        let _ = conn.driver.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conninfo_includes_all_present_parameters() {
        let backend = PostgresBackend::new(
            BackendConfig::new("pg.internal")
                .with_port(5433)
                .with_database("orders")
                .with_username("app")
                .with_password("secret")
                .with_connect_timeout(Duration::from_secs(2)),
        );
        assert_eq!(
            backend.conninfo(),
            "host=pg.internal port=5433 dbname=orders user=app password=secret connect_timeout=2"
        );
    }

    #[test]
    fn conninfo_skips_absent_parameters() {
        let backend = PostgresBackend::new(BackendConfig::new("localhost"));
        assert_eq!(backend.conninfo(), "host=localhost connect_timeout=3");
    }

    #[test]
    fn sub_second_timeout_rounds_up_for_libpq() {
        let backend = PostgresBackend::new(
            BackendConfig::new("localhost").with_connect_timeout(Duration::from_millis(200)),
        );
        assert_eq!(backend.conninfo(), "host=localhost connect_timeout=1");
    }
}
