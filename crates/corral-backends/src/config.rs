//! Backend connection parameters.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Immutable connection parameters shared by all adapters.
///
/// Supplied once at pool construction and read-only afterwards. Fields a
/// backend does not use are simply ignored by its adapter (Redis reads
/// `database` as a numeric database index, for example).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Server hostname or IP address.
    pub host: String,

    /// Server port; `None` picks the backend's conventional default.
    pub port: Option<u16>,

    /// User name, where the protocol authenticates.
    pub username: Option<String>,

    /// Password, where the protocol authenticates.
    pub password: Option<String>,

    /// Database name (or index, for key-value backends).
    pub database: Option<String>,

    /// Per-connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
}

impl BackendConfig {
    /// Create a configuration for the given host with defaults for
    /// everything else.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            username: None,
            password: None,
            database: None,
            connect_timeout_ms: 3_000,
        }
    }

    /// Set the server port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the user name.
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the password.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the database name or index.
    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Set the per-connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// The per-connect timeout.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::new("127.0.0.1")
    }
}
