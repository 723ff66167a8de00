//! HTTP surface: JSON endpoints over a [`Store`].
//!
//! Diesel is synchronous, so every store call is moved onto tokio's blocking
//! pool with [`with_store`]. Responses use one envelope:
//! `{"success": true, "data": ...}` or `{"success": false, "error": "..."}`.

pub mod catalog;
pub mod developers;
pub mod error;
pub mod leads;
pub mod market;

use crate::config::Config;
use crate::store::{Store, StoreError};
use axum::extract::Request;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use error::AppError;
use log::{info, warn};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self { success: true, data })
    }
}

/// Run a store call on the blocking pool and map its failure to a 500.
pub async fn with_store<T, F>(state: &AppState, f: F) -> Result<T, AppError>
where
    F: FnOnce(&dyn Store) -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || f(store.as_ref()))
        .await
        .map_err(|e| AppError::Internal(format!("store task failed: {}", e)))?
        .map_err(AppError::from)
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/developers", get(developers::list))
        .route("/api/developers/featured", get(developers::featured))
        .route("/api/developers/:slug", get(developers::detail))
        .route("/api/leads", get(leads::recent).post(leads::create))
        .route("/api/areas", get(catalog::areas))
        .route("/api/projects", get(catalog::projects))
        .route("/api/market/area/:area_name", get(market::area))
        .route("/api/market/area/:area_name/history", get(market::area_history))
        .route("/api/market/areas", get(market::areas))
        .route("/api/market/trends", get(market::trends))
        .route("/api/market/overview", get(market::overview))
        .fallback(route_not_found)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn route_not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(request).await;
    info!(
        "{} {} -> {} ({} ms)",
        method,
        path,
        response.status().as_u16(),
        started.elapsed().as_millis()
    );
    response
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    match origin.map(HeaderValue::from_str) {
        Some(Ok(value)) => cors.allow_origin(value),
        Some(Err(e)) => {
            warn!("Ignoring invalid CORS_ORIGIN ({}); allowing any origin", e);
            cors.allow_origin(Any)
        }
        None => cors.allow_origin(Any),
    }
}

pub async fn serve(cfg: &Config, store: Arc<dyn Store>) -> Result<(), String> {
    let app = router(AppState::new(store))
        .layer(middleware::from_fn(log_request))
        .layer(cors_layer(cfg.cors_origin.as_deref()));

    let address = cfg.listen_address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|e| format!("binding {} failed: {}", address, e))?;
    info!("API listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("server error: {}", e))?;

    info!("API shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{app, get};
    use crate::store::memory::MemoryStore;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn health_is_ok() {
        let (router, _) = app(MemoryStore::default());
        let (status, body) = get(router, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let (router, _) = app(MemoryStore::default());
        let (status, body) = get(router, "/api/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn store_failure_is_generic_500() {
        let (router, _) = app(MemoryStore::offline());
        let (status, body) = get(router, "/api/developers").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Internal server error");
    }
}
