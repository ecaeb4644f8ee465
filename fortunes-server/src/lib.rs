//! fortunes-server: random fortune sampling over HTTP
//!
//! Serves `POST /fortunes`, drawing a random sample of rows from the
//! `fortune` table through a bounded PostgreSQL connection pool.
//!
//! - [`db::pool`]: pool lifecycle and scoped connection leases
//! - [`db::repos`]: the fortune sampler
//! - [`models`]: validated request values and response shapes
//! - [`http`]: axum router, error mapping, graceful shutdown

pub mod config;
pub mod db;
pub mod http;
pub mod models;

pub use config::PoolConfig;
pub use db::{DbError, FortunePool, Lease, PoolStats};
pub use http::{run_server, ApiError, ServerConfig, ServerError};
