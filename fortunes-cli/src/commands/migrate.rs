//! Schema migration command

use anyhow::{Context, Result};
use clap::Parser;

use fortunes_server::db::migrations;
use fortunes_server::FortunePool;

use crate::config::DatabaseArgs;

/// Arguments for the migrate command
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub database: DatabaseArgs,
}

/// Create the fortune table if it does not exist
pub async fn run_migrate(args: MigrateArgs) -> Result<()> {
    let pool = FortunePool::connect(&args.database.pool_config())
        .await
        .context("Failed to create database pool")?;

    let result = migrations::run(&pool).await;
    pool.shutdown().await;
    result.context("Failed to run migrations")?;

    Ok(())
}
