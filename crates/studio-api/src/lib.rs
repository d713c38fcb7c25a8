//! # studio-api: HTTP Surface for tRPC Studio
//!
//! Serves the procedure catalog built at startup and relays executions to
//! the live tRPC endpoint.
//!
//! ## API Surface
//!
//! | Route                                 | Handler                          |
//! |---------------------------------------|----------------------------------|
//! | `GET /api/procedures`                 | [`routes::procedures`] listing   |
//! | `GET /api/procedures/:path`           | [`routes::procedures`] details   |
//! | `POST /api/procedures/:path/execute`  | [`routes::procedures`] execution |
//! | `GET /health/liveness`                | liveness check                   |
//! | `GET /health/readiness`               | readiness check                  |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → DefaultBodyLimit (2 MiB) → Handler
//! ```

pub mod error;
pub mod routes;
pub mod state;

use std::future::Future;

use axum::extract::{DefaultBodyLimit, State};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Request body limit for the execute route.
pub const BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Assemble the application router.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::procedures::router())
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http());

    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new().merge(health).merge(api).with_state(state)
}

/// Serve `state` on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, procedures = state.catalog.len(), "studio listening");
    }
    axum::serve(listener, app(state).into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
}

/// Liveness check. Always 200 while the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness check. The catalog is built before the listener is bound, so
/// a running server is always ready; the body reports the catalog size.
async fn readiness(State(state): State<AppState>) -> String {
    format!("ready ({} procedures)", state.catalog.len())
}
