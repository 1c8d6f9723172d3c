//! # panel-api: Axum Request Layer
//!
//! HTTP surface for Panel, built on Axum/Tower/Tokio. Every registered
//! endpoint runs the same pipeline:
//!
//! 1. Scope check (`auth`).
//! 2. Header, query and body normalization against the registry's
//!    validator schemas, then the constraint pass (`extractors`).
//! 3. The handler (`routes`).
//! 4. Response filtering through `merge_default` (`filter`).
//!
//! ## Routes
//!
//! - `/game_roles`: list (`GET`) and create (`POST`) questions.
//! - `/health/*`: Kubernetes health probes, outside the registry.
//!
//! Registry endpoints outside [`routes::ROUTED`] have no handler; `serve`
//! logs a warning for each at startup.
//!
//! ## Crate Policy
//!
//! - Schema semantics live in `panel-schema`; handlers only shape data.
//! - All errors map to structured HTTP responses via `AppError`.

pub mod auth;
pub mod error;
pub mod extractors;
pub mod filter;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;

pub use error::AppError;
pub use state::{AppConfig, AppState};

/// Assemble the application router.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::game_roles::router())
        .layer(DefaultBodyLimit::max(extractors::MAX_BODY_BYTES))
        .layer(middleware::tracing_layer::layer())
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness));

    Router::new().merge(health).merge(api)
}

/// Bind `0.0.0.0:<port>` and serve until the process is stopped.
pub async fn serve(state: AppState) -> std::io::Result<()> {
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], state.config.port));
    tracing::info!(config = ?state.config, "Panel API listening on {}", addr);
    for key in routes::unrouted_endpoints(&state.registry) {
        tracing::warn!(endpoint = %key, "registry endpoint has no route; requests will 404");
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: returns 200 when the application is ready to serve.
async fn readiness() -> &'static str {
    "ready"
}
