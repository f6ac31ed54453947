//! HTTP boundary for the production-time dashboard.
//!
//! A read-only JSON API over the cached report. Routing and error shaping
//! live here; every number comes from `tiempos_runtime::queries`.

pub mod handlers;
pub mod response;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tiempos_runtime::data_manager::DataManager;
use tokio::net::TcpListener;
use tracing::info;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<DataManager>,
}

impl AppState {
    pub fn new(manager: DataManager) -> Self {
        Self {
            manager: Arc::new(manager),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/status", get(handlers::status_handler))
        .route("/api/centros", get(handlers::centers_handler))
        .route("/api/fechas", get(handlers::dates_handler))
        .route("/api/summary", get(handlers::summary_handler))
        .route("/api/centro/:ids", get(handlers::center_detail_handler))
        .route(
            "/api/centro/:ids/articulos",
            get(handlers::center_items_handler),
        )
        .route(
            "/api/centro/:ids/articulos/mes/:mes",
            get(handlers::center_month_items_handler),
        )
        .fallback(handlers::not_found_handler)
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(addr: &str, state: AppState) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(
        report = %state.manager.report_path().display(),
        ttl_secs = state.manager.cache_ttl().as_secs(),
        "Listening on http://{}",
        listener.local_addr()?
    );
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
