//! Schema setup for the fortune table

use super::{DbError, FortunePool};

/// Create the `fortune` table if it does not exist yet.
pub async fn run(pool: &FortunePool) -> Result<(), DbError> {
    tracing::info!("Running fortune migrations...");

    let mut lease = pool.acquire().await?;
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS fortune (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            content TEXT NOT NULL
        )
        "#,
    )
    .execute(&mut *lease)
    .await?;

    tracing::info!("Fortune migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;

    #[tokio::test]
    #[ignore = "requires database"]
    async fn migrations_are_repeatable() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = FortunePool::connect(&PoolConfig::new(url))
            .await
            .expect("pool creation failed");

        run(&pool).await.expect("first run failed");
        run(&pool).await.expect("second run failed");
        pool.shutdown().await;
    }
}
