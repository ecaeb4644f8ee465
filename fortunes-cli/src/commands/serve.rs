//! HTTP server command
//!
//! Connects the pool first and exits non-zero if the database is
//! unreachable, so no request is ever served without a working store.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use fortunes_server::db::migrations;
use fortunes_server::http::{run_server, ServerConfig};
use fortunes_server::FortunePool;

use crate::config::DatabaseArgs;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to
    #[arg(long, short = 'b', env = "FORTUNES_BIND", default_value = "127.0.0.1:8000")]
    pub bind: SocketAddr,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Per-request timeout in seconds
    #[arg(long, env = "FORTUNES_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Create the fortune table before serving if it is missing
    #[arg(long)]
    pub migrate: bool,

    #[command(flatten)]
    pub database: DatabaseArgs,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let request_timeout = Duration::from_secs(args.request_timeout_secs);
    let pool_config = args.database.pool_config().bounded_by(request_timeout);

    // fail here, before binding, if the database is not reachable
    let pool = FortunePool::connect(&pool_config)
        .await
        .context("Failed to create database pool")?;

    if args.migrate {
        if let Err(e) = migrations::run(&pool).await {
            pool.shutdown().await;
            return Err(e).context("Failed to run migrations");
        }
    }

    let config = ServerConfig {
        bind_addr: args.bind,
        cors_permissive: args.cors_permissive,
        request_timeout,
    };

    tracing::info!("Starting fortunes server on {}", config.bind_addr);

    // Run server (blocks until shutdown)
    run_server(pool, config).await.context("Server error")?;

    Ok(())
}
