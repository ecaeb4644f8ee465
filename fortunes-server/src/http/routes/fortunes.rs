//! Fortune sampling endpoint

use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use serde::Serialize;
use sqlx::Connection;

use crate::db::FortuneRepo;
use crate::http::error::ApiError;
use crate::http::extractors::ValidQuantity;
use crate::http::server::AppState;
use crate::models::{Fortune, FortuneBatch};

/// One fortune on the wire
#[derive(Debug, Serialize)]
pub struct FortuneResponse {
    pub content: String,
}

impl From<Fortune> for FortuneResponse {
    fn from(f: Fortune) -> Self {
        Self { content: f.content }
    }
}

/// Sampled fortunes response
#[derive(Debug, Serialize)]
pub struct FortunesResponse {
    pub count: usize,
    pub items: Vec<FortuneResponse>,
}

impl From<FortuneBatch> for FortunesResponse {
    fn from(batch: FortuneBatch) -> Self {
        Self {
            count: batch.count,
            items: batch.items.into_iter().map(FortuneResponse::from).collect(),
        }
    }
}

/// POST /fortunes - return `quantity` random fortunes (default 5)
///
/// Quantity is validated by the extractor, before a connection is leased.
async fn sample_fortunes(
    State(state): State<Arc<AppState>>,
    ValidQuantity(quantity): ValidQuantity,
) -> Result<Json<FortunesResponse>, ApiError> {
    let mut lease = state.pool.acquire().await?;
    let mut tx = lease.begin().await?;

    let items = FortuneRepo::new(&mut tx).sample(quantity).await?;

    // commit explicitly, dropping `tx` rolls back
    tx.commit().await?;

    Ok(Json(FortuneBatch::from(items).into()))
}

/// Fortune routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/fortunes", post(sample_fortunes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn response_exposes_content_only() {
        let now = Utc::now();
        let batch = FortuneBatch::from(vec![Fortune {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            content: "You will write Rust.".into(),
        }]);

        let json = serde_json::to_value(FortunesResponse::from(batch)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"count": 1, "items": [{"content": "You will write Rust."}]})
        );
    }
}
