//! Pool configuration
//!
//! Sizing defaults follow the host's CPU count: half the cores warm,
//! all of the cores as the hard ceiling.

use std::time::Duration;

/// Default time to wait for a free connection before giving up.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default bound on the initial connectivity check and warm-up.
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Connections older than this are closed instead of reused.
pub const DEFAULT_MAX_LIFETIME: Duration = Duration::from_secs(60 * 60);

/// Default server-side limit on a single statement.
pub const DEFAULT_STATEMENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default wait for outstanding leases during shutdown.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection pool settings.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// PostgreSQL connection string
    pub database_url: String,
    /// Connections opened eagerly at startup
    pub min_size: u32,
    /// Upper bound on concurrently open connections
    pub max_size: u32,
    pub acquire_timeout: Duration,
    pub startup_timeout: Duration,
    pub max_lifetime: Duration,
    /// Enforced by PostgreSQL per session; zero disables it
    pub statement_timeout: Duration,
    pub shutdown_timeout: Duration,
}

impl PoolConfig {
    /// Build a config for `database_url` with CPU-derived sizing.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            min_size: default_min_size(),
            max_size: default_max_size(),
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
            max_lifetime: DEFAULT_MAX_LIFETIME,
            statement_timeout: DEFAULT_STATEMENT_TIMEOUT,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Clamp sizes so that `1 <= min_size <= max_size`.
    pub fn normalized(mut self) -> Self {
        if self.max_size == 0 {
            tracing::warn!("database_pool_max_size must be at least 1, using 1");
            self.max_size = 1;
        }
        if self.min_size == 0 {
            tracing::warn!("database_pool_min_size must be at least 1, using 1");
            self.min_size = 1;
        }
        if self.min_size > self.max_size {
            tracing::warn!(
                min_size = self.min_size,
                max_size = self.max_size,
                "database_pool_min_size exceeds max size, clamping"
            );
            self.min_size = self.max_size;
        }
        self
    }

    /// Keep queries from outliving the request that issued them.
    ///
    /// A zero (disabled) statement timeout is replaced by `request_timeout`.
    pub fn bounded_by(mut self, request_timeout: Duration) -> Self {
        if self.statement_timeout.is_zero() || self.statement_timeout > request_timeout {
            self.statement_timeout = request_timeout;
        }
        self
    }
}

/// Half of the available cores, at least one.
pub fn default_min_size() -> u32 {
    ((num_cpus::get() / 2) as u32).max(1)
}

/// All available cores, at least one.
pub fn default_max_size() -> u32 {
    (num_cpus::get() as u32).max(1)
}
