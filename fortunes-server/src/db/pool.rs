//! Database connection pool management
//!
//! Wraps sqlx's `PgPool` with the startup and lease rules the service
//! relies on:
//!
//! - startup connects, pings and warms `min_size` connections, all within
//!   `startup_timeout`, or fails with [`DbError::Connectivity`]
//! - at most `max_size` connections exist; callers past that wait up to
//!   `acquire_timeout` and then get [`DbError::PoolExhausted`]
//! - connections older than `max_lifetime` are closed instead of reused
//! - every session carries `statement_timeout`, so a query whose caller was
//!   cancelled is aborted by the server and its slot comes back
//! - a [`Lease`] hands its connection back when dropped, on every path

use std::ops::{Deref, DerefMut};
use std::str::FromStr;
use std::time::{Duration, Instant};

use serde::Serialize;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{PgConnection, PgPool, Postgres};

use super::DbError;
use crate::config::PoolConfig;

/// Reported to the server as `application_name` on every session.
const APPLICATION_NAME: &str = concat!("fortunes_v", env!("CARGO_PKG_VERSION"));

/// Shared handle to the process-wide connection pool.
///
/// Cloning is cheap; all clones refer to the same set of connections.
#[derive(Debug, Clone)]
pub struct FortunePool {
    pool: PgPool,
    max_size: u32,
    shutdown_timeout: Duration,
}

/// Point-in-time view of pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Open connections, leased or idle
    pub size: u32,
    pub idle: u32,
    pub leased: u32,
    pub max_size: u32,
}

impl FortunePool {
    /// Create the pool and prove the database is reachable.
    ///
    /// Opens one connection, runs `SELECT 1` on it, then opens the rest of
    /// `min_size` before returning.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Connectivity`] if the URL is invalid, a connection
    /// fails, or the whole sequence exceeds `startup_timeout`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let pool = FortunePool::connect(&PoolConfig::new("postgres://localhost/fortunes")).await?;
    /// ```
    pub async fn connect(config: &PoolConfig) -> Result<Self, DbError> {
        let config = config.clone().normalized();
        let connect_options = connect_options(&config)?;
        let target = format!("{}:{}", connect_options.get_host(), connect_options.get_port());

        tracing::info!(
            %target,
            min_size = config.min_size,
            max_size = config.max_size,
            max_lifetime_secs = config.max_lifetime.as_secs(),
            statement_timeout_ms = config.statement_timeout.as_millis() as u64,
            "Connecting to database"
        );

        let startup = async {
            let pool = pool_options(&config)
                .connect_with(connect_options)
                .await?;
            warm_up(&pool, config.min_size).await?;
            Ok::<_, sqlx::Error>(pool)
        };

        let pool = tokio::time::timeout(config.startup_timeout, startup)
            .await
            .map_err(|_| {
                DbError::Connectivity(format!(
                    "{target} unreachable within {:?}",
                    config.startup_timeout
                ))
            })?
            .map_err(|e| match e {
                sqlx::Error::PoolTimedOut => DbError::Connectivity(format!(
                    "{target} unreachable within {:?}",
                    config.acquire_timeout
                )),
                other => DbError::Connectivity(format!("{target}: {other}")),
            })?;

        let pool = Self {
            pool,
            max_size: config.max_size,
            shutdown_timeout: config.shutdown_timeout,
        };
        tracing::info!(stats = ?pool.stats(), "Database pool ready");

        Ok(pool)
    }

    /// Create a pool that opens nothing until first use.
    #[cfg(test)]
    pub(crate) fn lazy(config: &PoolConfig) -> Result<Self, DbError> {
        let config = config.clone().normalized();
        let pool = pool_options(&config)
            .min_connections(0)
            .connect_lazy_with(connect_options(&config)?);

        Ok(Self {
            pool,
            max_size: config.max_size,
            shutdown_timeout: config.shutdown_timeout,
        })
    }

    /// Borrow a connection exclusively until the returned [`Lease`] drops.
    ///
    /// If the future is cancelled while waiting, nothing is leaked; a
    /// connection that was being opened goes back to the pool.
    ///
    /// A timeout while every slot is leased is [`DbError::PoolExhausted`].
    /// A timeout or failure while slots are free means no new connection
    /// could be opened, and is [`DbError::Connectivity`].
    pub async fn acquire(&self) -> Result<Lease, DbError> {
        let err = match self.pool.acquire().await {
            Ok(conn) => return Ok(Lease::new(conn)),
            Err(e) => e,
        };

        let stats = self.stats();
        match err {
            sqlx::Error::PoolClosed => Err(DbError::PoolClosed),
            sqlx::Error::PoolTimedOut if stats.leased >= stats.max_size => {
                tracing::warn!(?stats, "Timed out waiting for a connection");
                Err(DbError::PoolExhausted)
            }
            sqlx::Error::PoolTimedOut => {
                tracing::error!(?stats, "Could not open a database connection");
                Err(DbError::Connectivity(
                    "no connection could be opened before the acquire timeout".into(),
                ))
            }
            other => {
                tracing::error!(?stats, "Could not open a database connection: {}", other);
                Err(DbError::Connectivity(other.to_string()))
            }
        }
    }

    /// Stop handing out leases and close every connection.
    ///
    /// Waits up to the configured shutdown timeout for outstanding leases.
    /// Calling this more than once is harmless.
    pub async fn shutdown(&self) {
        if self.pool.is_closed() {
            tracing::debug!("Database pool already closed");
            return;
        }

        tracing::info!(leased = self.stats().leased, "Closing database pool");
        match tokio::time::timeout(self.shutdown_timeout, self.pool.close()).await {
            Ok(()) => tracing::info!("Database pool closed"),
            Err(_) => tracing::warn!(
                leased = self.stats().leased,
                timeout = ?self.shutdown_timeout,
                "Leases still outstanding after shutdown timeout"
            ),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    pub fn stats(&self) -> PoolStats {
        let size = self.pool.size();
        let idle = u32::try_from(self.pool.num_idle()).unwrap_or(u32::MAX);
        PoolStats {
            size,
            idle,
            leased: size.saturating_sub(idle),
            max_size: self.max_size,
        }
    }
}

fn connect_options(config: &PoolConfig) -> Result<PgConnectOptions, DbError> {
    let options = PgConnectOptions::from_str(&config.database_url)
        .map_err(|e| DbError::Connectivity(format!("invalid database url: {e}")))?
        .application_name(APPLICATION_NAME);

    // the server aborts statements that outlive a cancelled request
    if config.statement_timeout.is_zero() {
        return Ok(options);
    }
    let timeout_ms = config.statement_timeout.as_millis().to_string();
    Ok(options.options([("statement_timeout", timeout_ms)]))
}

fn pool_options(config: &PoolConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .min_connections(config.min_size)
        .max_connections(config.max_size)
        .acquire_timeout(config.acquire_timeout)
        .max_lifetime(config.max_lifetime)
}

/// Ping one connection, then hold `min_size` at once so they all get opened.
async fn warm_up(pool: &PgPool, min_size: u32) -> Result<(), sqlx::Error> {
    let mut first = pool.acquire().await?;
    sqlx::query("SELECT 1").execute(&mut *first).await?;

    let rest = futures::future::try_join_all((1..min_size).map(|_| pool.acquire())).await?;
    tracing::debug!(warmed = rest.len() + 1, "Warmed database connections");

    Ok(())
}

/// Exclusive, scoped use of one pooled connection.
///
/// Dereferences to [`PgConnection`]. Dropping the lease returns the
/// connection to the pool, or closes it if the pool is shutting down.
#[derive(Debug)]
pub struct Lease {
    conn: PoolConnection<Postgres>,
    acquired_at: Instant,
}

impl Lease {
    fn new(conn: PoolConnection<Postgres>) -> Self {
        Self {
            conn,
            acquired_at: Instant::now(),
        }
    }

    /// How long this lease has been held.
    pub fn held_for(&self) -> Duration {
        self.acquired_at.elapsed()
    }
}

impl Deref for Lease {
    type Target = PgConnection;

    fn deref(&self) -> &PgConnection {
        &self.conn
    }
}

impl DerefMut for Lease {
    fn deref_mut(&mut self) -> &mut PgConnection {
        &mut self.conn
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        tracing::trace!(held_ms = self.held_for().as_millis() as u64, "Lease released");
    }
}
