//! # corral-backends
//!
//! Ready-made [`ConnectionBackend`](corral_pool::ConnectionBackend)
//! adapters for `corral-pool`.
//!
//! Each adapter is a thin shim over an existing async driver crate: it
//! translates a [`BackendConfig`] into the driver's connect parameters,
//! maps connect errors to `None` (logging the cause), and implements the
//! cheapest liveness probe the protocol offers. The pool algorithm itself
//! lives entirely in `corral-pool`; nothing here duplicates it.
//!
//! Adapters are feature-gated so a deployment only compiles the drivers
//! it talks to:
//!
//! - `mysql`: [`MySqlBackend`] over `mysql_async`, probing with `ping`.
//! - `postgres`: [`PostgresBackend`] over `tokio-postgres`, probing with
//!   `SELECT 1`.
//! - `redis`: [`RedisBackend`] over `redis`, probing with `PING`.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;

#[cfg(feature = "mysql")]
pub mod mysql;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "redis")]
pub mod redis;

pub use config::BackendConfig;

#[cfg(feature = "mysql")]
pub use self::mysql::MySqlBackend;

#[cfg(feature = "postgres")]
pub use self::postgres::{PostgresBackend, PostgresConn};

#[cfg(feature = "redis")]
pub use self::redis::RedisBackend;
