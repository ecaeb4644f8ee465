//! Fortune repository
//!
//! Sampling is a single query: shuffle the whole table with the server's
//! `random()` and keep the first N rows. Fewer rows come back when the
//! table is smaller than N.

use sqlx::PgConnection;

use crate::db::DbError;
use crate::models::{Fortune, Quantity};

const SAMPLE_SQL: &str = r#"
    SELECT id, created_at, updated_at, content
    FROM fortune
    ORDER BY random()
    LIMIT $1
"#;

/// Fortune repository bound to one leased connection
pub struct FortuneRepo<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> FortuneRepo<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    /// Draw up to `quantity` fortunes uniformly at random, without replacement.
    ///
    /// Order is the draw order and differs between calls. Query failures are
    /// returned as-is; nothing is retried here.
    pub async fn sample(&mut self, quantity: Quantity) -> Result<Vec<Fortune>, DbError> {
        let fortunes = sqlx::query_as::<_, Fortune>(SAMPLE_SQL)
            .bind(quantity.get())
            .fetch_all(&mut *self.conn)
            .await?;

        tracing::debug!(
            requested = quantity.get(),
            returned = fortunes.len(),
            "Sampled fortunes"
        );

        Ok(fortunes)
    }
}
