//! Environment-backed settings shared by subcommands
//!
//! Every option can come from a flag, the environment, or `.env`.

use std::time::Duration;

use clap::Args;
use fortunes_server::config::{default_max_size, default_min_size, PoolConfig};

/// Database connection and pool settings
#[derive(Args, Debug, Clone)]
pub struct DatabaseArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Connections opened at startup (default: half the CPU count, at least 1)
    #[arg(long, env = "DATABASE_POOL_MIN_SIZE")]
    pub database_pool_min_size: Option<u32>,

    /// Maximum open connections (default: CPU count, at least 1)
    #[arg(long, env = "DATABASE_POOL_MAX_SIZE")]
    pub database_pool_max_size: Option<u32>,

    /// Seconds to wait for a free connection before failing a request
    #[arg(long, env = "DATABASE_ACQUIRE_TIMEOUT_SECS", default_value_t = 5)]
    pub acquire_timeout_secs: u64,

    /// Seconds allowed for the startup connectivity check
    #[arg(long, env = "DATABASE_STARTUP_TIMEOUT_SECS", default_value_t = 10)]
    pub startup_timeout_secs: u64,

    /// Age in seconds after which a connection is replaced
    #[arg(long, env = "DATABASE_MAX_LIFETIME_SECS", default_value_t = 3600)]
    pub max_lifetime_secs: u64,

    /// Seconds a single statement may run before PostgreSQL aborts it
    #[arg(long, env = "DATABASE_STATEMENT_TIMEOUT_SECS", default_value_t = 30)]
    pub statement_timeout_secs: u64,

    /// Seconds to wait for in-flight leases on shutdown
    #[arg(long, env = "DATABASE_SHUTDOWN_TIMEOUT_SECS", default_value_t = 5)]
    pub shutdown_timeout_secs: u64,
}

impl DatabaseArgs {
    pub fn pool_config(&self) -> PoolConfig {
        let max_size = self.database_pool_max_size.unwrap_or_else(default_max_size);
        let min_size = self
            .database_pool_min_size
            .unwrap_or_else(|| default_min_size().min(max_size.max(1)));

        PoolConfig {
            database_url: self.database_url.clone(),
            min_size,
            max_size,
            acquire_timeout: Duration::from_secs(self.acquire_timeout_secs),
            startup_timeout: Duration::from_secs(self.startup_timeout_secs),
            max_lifetime: Duration::from_secs(self.max_lifetime_secs),
            statement_timeout: Duration::from_secs(self.statement_timeout_secs),
            shutdown_timeout: Duration::from_secs(self.shutdown_timeout_secs),
        }
        .normalized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        db: DatabaseArgs,
    }

    #[test]
    fn explicit_sizes_are_used() {
        let cli = TestCli::parse_from([
            "test",
            "--database-url",
            "postgres://localhost/fortunes",
            "--database-pool-min-size",
            "2",
            "--database-pool-max-size",
            "6",
        ]);
        let config = cli.db.pool_config();

        assert_eq!(config.min_size, 2);
        assert_eq!(config.max_size, 6);
        assert_eq!(config.max_lifetime, Duration::from_secs(3600));
        assert_eq!(config.statement_timeout, Duration::from_secs(30));
    }

    #[test]
    fn default_min_never_exceeds_explicit_max() {
        let cli = TestCli::parse_from([
            "test",
            "--database-url",
            "postgres://localhost/fortunes",
            "--database-pool-max-size",
            "1",
        ]);
        let config = cli.db.pool_config();

        assert_eq!(config.min_size, 1);
        assert_eq!(config.max_size, 1);
    }
}
