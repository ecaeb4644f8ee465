//! Axum server setup
//!
//! Server skeleton with:
//! - Localhost-only CORS by default
//! - Tracing and timeout middleware
//! - Graceful shutdown on SIGTERM/Ctrl+C, followed by pool shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderValue, StatusCode};
use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::routes;
use crate::db::FortunePool;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:8000)
    pub bind_addr: SocketAddr,

    /// Allow permissive CORS (default: false = localhost only)
    ///
    /// WARNING: Setting this to true allows any origin.
    pub cors_permissive: bool,

    /// Upper bound on a single request, including pool wait
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            cors_permissive: false,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: FortunePool,
}

/// Build the application router with all routes.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let cors = if config.cors_permissive {
        tracing::warn!("CORS: Permissive mode enabled - all origins allowed");
        CorsLayer::permissive()
    } else {
        // Localhost only
        let port = config.bind_addr.port();
        let origins: Vec<HeaderValue> = ["localhost", "127.0.0.1"]
            .iter()
            .filter_map(|host| format!("http://{host}:{port}").parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout,
        ))
        .layer(cors);

    Router::new()
        .merge(routes::health::router())
        .merge(routes::fortunes::router())
        .layer(middleware)
        .with_state(Arc::new(state))
}

/// Run the HTTP server until a shutdown signal, then close the pool.
///
/// # Example
///
/// ```ignore
/// let pool = FortunePool::connect(&PoolConfig::new(database_url)).await?;
/// run_server(pool, ServerConfig::default()).await?;
/// ```
pub async fn run_server(pool: FortunePool, config: ServerConfig) -> Result<(), ServerError> {
    let app = build_router(AppState { pool: pool.clone() }, &config);

    // Bind listener
    let listener = match TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            pool.shutdown().await;
            return Err(e.into());
        }
    };
    tracing::info!("Listening on {}", config.bind_addr);

    // Run with graceful shutdown
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    pool.shutdown().await;
    served?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    // The pool below points at a closed port and never connects, so any
    // request that reached the data layer would fail with a 5xx.

    fn test_pool() -> FortunePool {
        let config = PoolConfig {
            min_size: 1,
            max_size: 2,
            acquire_timeout: Duration::from_millis(200),
            ..PoolConfig::new("postgres://fortunes@127.0.0.1:1/fortunes")
        };
        FortunePool::lazy(&config).unwrap()
    }

    fn post_fortunes(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/fortunes")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 8000);
        assert!(!config.cors_permissive);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn health_reports_pool() {
        let pool = test_pool();
        let app = build_router(AppState { pool }, &ServerConfig::default());

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["pool"]["max_size"], 2);
        assert_eq!(json["pool"]["leased"], 0);
    }

    #[tokio::test]
    async fn quantity_zero_rejected_without_touching_pool() {
        let pool = test_pool();
        let app = build_router(AppState { pool: pool.clone() }, &ServerConfig::default());

        let response = app
            .oneshot(post_fortunes(r#"{"quantity": 0}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json_body(response).await["error"], "validation_error");
        assert_eq!(pool.stats().size, 0);
    }

    #[tokio::test]
    async fn quantity_twenty_one_rejected() {
        let pool = test_pool();
        let app = build_router(AppState { pool: pool.clone() }, &ServerConfig::default());

        let response = app
            .oneshot(post_fortunes(r#"{"quantity": 21}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(pool.stats().size, 0);
    }

    #[tokio::test]
    async fn malformed_body_rejected() {
        let pool = test_pool();
        let app = build_router(AppState { pool: pool.clone() }, &ServerConfig::default());

        let response = app
            .oneshot(post_fortunes(r#"{"quantity": "lots"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(pool.stats().size, 0);
    }

    #[tokio::test]
    async fn closed_pool_is_unavailable() {
        let pool = test_pool();
        pool.shutdown().await;
        let app = build_router(AppState { pool }, &ServerConfig::default());

        let response = app.oneshot(post_fortunes("{}")).await.unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn refused_connection_is_database_unavailable() {
        let pool = test_pool();
        let app = build_router(AppState { pool }, &ServerConfig::default());

        let response = app.oneshot(post_fortunes("{}")).await.unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(response.headers().get("retry-after").is_none());
        assert_eq!(json_body(response).await["error"], "database_unavailable");
    }

    #[tokio::test]
    async fn wrong_method_is_405() {
        let app = build_router(AppState { pool: test_pool() }, &ServerConfig::default());

        let response = app
            .oneshot(Request::builder().uri("/fortunes").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    /// Single-connection pool whose session has a private `fortune` table
    /// holding `rows`. With `rows == None` the session cannot see any
    /// `fortune` table at all.
    async fn seeded_pool(rows: Option<usize>) -> FortunePool {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let config = PoolConfig {
            min_size: 1,
            max_size: 1,
            acquire_timeout: Duration::from_secs(2),
            ..PoolConfig::new(url)
        };
        let pool = FortunePool::connect(&config).await.expect("pool creation failed");
        let mut lease = pool.acquire().await.expect("acquire failed");

        let Some(rows) = rows else {
            sqlx::query("SET search_path TO pg_catalog")
                .execute(&mut *lease)
                .await
                .expect("set search_path failed");
            return pool;
        };

        sqlx::query(
            r#"
            CREATE TEMP TABLE fortune (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                content TEXT NOT NULL
            )
            "#,
        )
        .execute(&mut *lease)
        .await
        .expect("create temp table failed");

        for i in 0..rows {
            sqlx::query("INSERT INTO fortune (content) VALUES ($1)")
                .bind(format!("fortune #{i}"))
                .execute(&mut *lease)
                .await
                .expect("insert failed");
        }
        pool
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn fewer_rows_than_requested_returns_all() {
        let pool = seeded_pool(Some(3)).await;
        let app = build_router(AppState { pool: pool.clone() }, &ServerConfig::default());

        let response = app
            .oneshot(post_fortunes(r#"{"quantity": 5}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["count"], 3);
        let items = json["items"].as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|item| item["content"]
            .as_str()
            .is_some_and(|c| c.starts_with("fortune #"))));
        assert!(items[0].get("id").is_none());

        pool.shutdown().await;
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn empty_table_returns_empty_batch() {
        let pool = seeded_pool(Some(0)).await;
        let app = build_router(AppState { pool: pool.clone() }, &ServerConfig::default());

        let response = app.oneshot(post_fortunes("")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({"count": 0, "items": []})
        );
        pool.shutdown().await;
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn failed_sample_returns_lease() {
        let pool = seeded_pool(None).await;
        let app = build_router(AppState { pool: pool.clone() }, &ServerConfig::default());

        let response = app
            .clone()
            .oneshot(post_fortunes(r#"{"quantity": 2}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        // a leaked lease would make this a 503 once the single slot times out
        let response = app.oneshot(post_fortunes("{}")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        pool.shutdown().await;
    }
}
